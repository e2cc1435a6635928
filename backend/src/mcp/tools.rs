//! MCP tool definitions and dispatch.
//!
//! Every tool answers with a single `text` content item holding a
//! pretty-printed JSON object with a `success` flag. Storage failures are
//! reported inside that object, never as JSON-RPC errors.

use crate::state::AppState;
use minimart_types::{
    CreateTodoRequest, RecordKind, TodoFilter, TodoId, UpdateTodoRequest, MAX_TODOS_PER_USER,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

/// Errors that surface as JSON-RPC errors rather than tool results.
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    #[error("Tool {0} not found")]
    UnknownTool(String),
}

#[derive(Debug, Deserialize)]
struct UserIdArgs {
    user_id: String,
    #[serde(default)]
    is_complete: Option<bool>,
    #[serde(default)]
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TodoIdArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTodoArgs {
    id: String,
    #[serde(flatten)]
    update: UpdateTodoRequest,
}

#[derive(Debug, Deserialize)]
struct RecordArgs {
    kind: String,
    id: String,
}

/// Tool descriptors returned by `tools/list`.
pub fn definitions() -> Vec<Value> {
    let empty_schema = json!({"type": "object", "properties": {}, "required": []});
    let id_schema = json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "Todo ID"}
        },
        "required": ["id"]
    });

    let mut tools = vec![
        json!({
            "name": "generate_user_id",
            "title": "Generate User ID",
            "description": "Generate a new unique user ID (UUID v4) for creating todos",
            "inputSchema": empty_schema
        }),
        json!({
            "name": "create_todo",
            "title": "Create Todo",
            "description": format!(
                "Create a new todo item. Maximum of {} todos per user allowed. If user already has {} todos, they must DELETE existing todos first (completing todos does not free up space).",
                MAX_TODOS_PER_USER, MAX_TODOS_PER_USER
            ),
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": {"type": "string", "minLength": 1},
                    "user_id": {"type": "string", "minLength": 1},
                    "is_complete": {"type": "boolean", "default": false}
                },
                "required": ["title", "user_id"]
            }
        }),
        json!({
            "name": "get_todos_by_user",
            "title": "Get Todos by User",
            "description": "Get all todos for a specific user, optionally filtered by completion state or title text",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": {"type": "string", "minLength": 1},
                    "is_complete": {"type": "boolean"},
                    "search": {"type": "string", "description": "Case-insensitive title substring"}
                },
                "required": ["user_id"]
            }
        }),
        json!({
            "name": "update_todo",
            "title": "Update Todo",
            "description": "Update an existing todo",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": {"type": "string", "minLength": 1},
                    "title": {"type": "string"},
                    "is_complete": {"type": "boolean"}
                },
                "required": ["id"]
            }
        }),
        json!({
            "name": "complete_todo",
            "title": "Complete Todo",
            "description": "Mark a todo as completed",
            "inputSchema": id_schema
        }),
        json!({
            "name": "reopen_todo",
            "title": "Reopen Todo",
            "description": "Mark a todo as incomplete",
            "inputSchema": id_schema
        }),
        json!({
            "name": "delete_todo",
            "title": "Delete Todo",
            "description": "Delete a todo by ID",
            "inputSchema": id_schema
        }),
    ];

    for kind in RecordKind::ALL {
        tools.push(json!({
            "name": format!("list_{}", kind),
            "title": format!("List {}", capitalize(kind.as_str())),
            "description": format!("Return all {} master data", kind),
            "inputSchema": empty_schema
        }));
    }

    tools.push(json!({
        "name": "get_record",
        "title": "Get Record",
        "description": "Return a single master data record by kind and ID",
        "inputSchema": {
            "type": "object",
            "properties": {
                "kind": {
                    "type": "string",
                    "enum": RecordKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>()
                },
                "id": {"type": "string"}
            },
            "required": ["kind", "id"]
        }
    }));

    tools
}

/// Invoke a tool by name.
pub async fn call(state: &AppState, name: &str, arguments: Value) -> Result<Value, ToolCallError> {
    info!("MCP: Calling tool {}", name);

    let outcome = match name {
        "generate_user_id" => Ok(json!({
            "success": true,
            "message": "User ID generated successfully",
            "user_id": Uuid::new_v4().to_string()
        })),
        "create_todo" => create_todo(state, arguments).await,
        "get_todos_by_user" => get_todos_by_user(state, arguments).await,
        "update_todo" => update_todo(state, arguments).await,
        "complete_todo" => set_complete(state, arguments, true).await,
        "reopen_todo" => set_complete(state, arguments, false).await,
        "delete_todo" => delete_todo(state, arguments).await,
        "get_record" => get_record(state, arguments),
        other => match other
            .strip_prefix("list_")
            .and_then(|kind| kind.parse::<RecordKind>().ok())
        {
            Some(kind) => return Ok(text_content(&state.catalog().list_all(kind))),
            None => return Err(ToolCallError::UnknownTool(other.to_string())),
        },
    };

    let body = outcome.unwrap_or_else(|message| {
        json!({
            "success": false,
            "error": message
        })
    });
    Ok(text_content(&body))
}

async fn create_todo(state: &AppState, arguments: Value) -> Result<Value, String> {
    let request: CreateTodoRequest = parse_args(arguments)?;
    let todo = state.create_todo(request).await.map_err(|e| e.to_string())?;
    Ok(json!({
        "success": true,
        "message": "Todo created successfully",
        "todo": todo
    }))
}

async fn get_todos_by_user(state: &AppState, arguments: Value) -> Result<Value, String> {
    let args: UserIdArgs = parse_args(arguments)?;
    if args.user_id.trim().is_empty() {
        return Err("User ID is required".to_string());
    }
    let filter = TodoFilter {
        user_id: args.user_id,
        is_complete: args.is_complete,
        search: args.search,
    };
    let todos = state.list_todos(&filter).await.map_err(|e| e.to_string())?;
    Ok(json!({
        "success": true,
        "user_id": filter.user_id,
        "count": todos.len(),
        "todos": todos
    }))
}

async fn update_todo(state: &AppState, arguments: Value) -> Result<Value, String> {
    let args: UpdateTodoArgs = parse_args(arguments)?;
    let id = parse_todo_id(&args.id)?;
    let todo = state
        .update_todo(&id, args.update)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(not_found)?;
    Ok(json!({
        "success": true,
        "message": "Todo updated successfully",
        "todo": todo
    }))
}

async fn set_complete(state: &AppState, arguments: Value, complete: bool) -> Result<Value, String> {
    let args: TodoIdArgs = parse_args(arguments)?;
    let id = parse_todo_id(&args.id)?;
    let result = if complete {
        state.complete_todo(&id).await
    } else {
        state.reopen_todo(&id).await
    };
    let todo = result.map_err(|e| e.to_string())?.ok_or_else(not_found)?;
    let message = if complete {
        "Todo marked as completed"
    } else {
        "Todo marked as incomplete"
    };
    Ok(json!({
        "success": true,
        "message": message,
        "todo": todo
    }))
}

async fn delete_todo(state: &AppState, arguments: Value) -> Result<Value, String> {
    let args: TodoIdArgs = parse_args(arguments)?;
    let id = parse_todo_id(&args.id)?;
    if !state.delete_todo(&id).await.map_err(|e| e.to_string())? {
        return Err(not_found());
    }
    Ok(json!({
        "success": true,
        "message": "Todo deleted successfully",
        "id": args.id
    }))
}

fn get_record(state: &AppState, arguments: Value) -> Result<Value, String> {
    let args: RecordArgs = parse_args(arguments)?;
    let kind: RecordKind = args.kind.parse()?;
    let record = state
        .catalog()
        .find_by_id(kind, &args.id)
        .ok_or_else(|| format!("{} not found", kind.singular()))?;
    Ok(json!({
        "success": true,
        "kind": kind,
        "record": record
    }))
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))
}

/// Unknown and malformed IDs are both reported as a missing todo.
fn parse_todo_id(id: &str) -> Result<TodoId, String> {
    id.trim().parse::<TodoId>().map_err(|_| not_found())
}

fn not_found() -> String {
    "Todo not found".to_string()
}

fn text_content(body: &Value) -> Value {
    let text = serde_json::to_string_pretty(body).unwrap_or_else(|e| {
        error!("Failed to serialize tool result: {}", e);
        String::new()
    });
    json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
