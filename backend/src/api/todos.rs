//! Todo API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use minimart_types::{
    api::{
        ErrorResponse, TodoDeletedResponse, TodoListResponse, TodoNotFoundResponse, TodoResponse,
    },
    CreateTodoRequest, Todo, TodoFilter, TodoId, UpdateTodoRequest,
};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::IntoParams;

use crate::state::AppState;
use crate::storage::StorageError;

/// Query parameters for listing todos.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TodoQuery {
    /// Owner of the todos
    pub user_id: Option<String>,
    /// Only return todos in this completion state
    pub is_complete: Option<bool>,
    /// Case-insensitive title search
    #[serde(alias = "search")]
    pub q: Option<String>,
}

fn bad_request(error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response()
}

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(TodoNotFoundResponse::new(id))).into_response()
}

fn storage_failure(status: StatusCode, context: &str, e: StorageError) -> Response {
    error!("Error {}: {}", context, e);
    (status, Json(ErrorResponse::new(e.to_string()))).into_response()
}

/// Create a new todo.
#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoResponse),
        (status = 400, description = "Missing fields or per-user limit reached", body = ErrorResponse)
    )
)]
pub async fn create_todo(
    State(state): State<AppState>,
    request: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details(
                    "Title and user_id are required",
                    rejection.body_text(),
                )),
            )
                .into_response()
        }
    };

    match state.create_todo(request).await {
        Ok(todo) => (
            StatusCode::CREATED,
            Json(TodoResponse {
                success: true,
                message: "Todo created successfully".to_string(),
                data: todo,
            }),
        )
            .into_response(),
        Err(e) => storage_failure(StatusCode::BAD_REQUEST, "creating todo", e),
    }
}

/// List a user's todos.
#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    params(TodoQuery),
    responses(
        (status = 200, description = "The user's todos, newest first", body = TodoListResponse),
        (status = 400, description = "Missing user_id", body = ErrorResponse)
    )
)]
pub async fn list_todos(State(state): State<AppState>, Query(query): Query<TodoQuery>) -> Response {
    let Some(user_id) = query.user_id.filter(|id| !id.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details(
                "user_id is required",
                "Please provide user_id as query parameter",
            )),
        )
            .into_response();
    };

    let filter = TodoFilter {
        user_id,
        is_complete: query.is_complete,
        search: query.q,
    };
    match state.list_todos(&filter).await {
        Ok(todos) => Json(TodoListResponse {
            success: true,
            count: todos.len(),
            data: todos,
        })
        .into_response(),
        Err(e) => storage_failure(StatusCode::INTERNAL_SERVER_ERROR, "getting todos", e),
    }
}

/// Update a todo.
#[utoipa::path(
    put,
    path = "/todos/{id}",
    tag = "todos",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = TodoNotFoundResponse)
    )
)]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    update: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Response {
    let Json(update) = match update {
        Ok(update) => update,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let Ok(todo_id) = id.parse::<TodoId>() else {
        return not_found(&id);
    };
    respond_with_todo(
        state.update_todo(&todo_id, update).await,
        &id,
        "Todo updated successfully",
        "updating todo",
    )
}

/// Mark a todo as completed.
#[utoipa::path(
    put,
    path = "/todos/{id}/complete",
    tag = "todos",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    responses(
        (status = 200, description = "Todo completed", body = TodoResponse),
        (status = 404, description = "Todo not found", body = TodoNotFoundResponse)
    )
)]
pub async fn complete_todo(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(todo_id) = id.parse::<TodoId>() else {
        return not_found(&id);
    };
    respond_with_todo(
        state.complete_todo(&todo_id).await,
        &id,
        "Todo marked as completed",
        "completing todo",
    )
}

/// Mark a todo as incomplete.
#[utoipa::path(
    put,
    path = "/todos/{id}/reopen",
    tag = "todos",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    responses(
        (status = 200, description = "Todo reopened", body = TodoResponse),
        (status = 404, description = "Todo not found", body = TodoNotFoundResponse)
    )
)]
pub async fn reopen_todo(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(todo_id) = id.parse::<TodoId>() else {
        return not_found(&id);
    };
    respond_with_todo(
        state.reopen_todo(&todo_id).await,
        &id,
        "Todo marked as incomplete",
        "reopening todo",
    )
}

/// Delete a todo.
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    tag = "todos",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    responses(
        (status = 200, description = "Todo deleted", body = TodoDeletedResponse),
        (status = 404, description = "Todo not found", body = TodoNotFoundResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_todo(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(todo_id) = id.parse::<TodoId>() else {
        return not_found(&id);
    };
    match state.delete_todo(&todo_id).await {
        Ok(true) => {
            info!("Deleted todo via API: {}", todo_id);
            Json(TodoDeletedResponse {
                success: true,
                message: "Todo deleted successfully".to_string(),
                id: todo_id,
            })
            .into_response()
        }
        Ok(false) => not_found(&id),
        Err(e) => storage_failure(StatusCode::INTERNAL_SERVER_ERROR, "deleting todo", e),
    }
}

fn respond_with_todo(
    result: Result<Option<Todo>, StorageError>,
    id: &str,
    message: &str,
    context: &str,
) -> Response {
    match result {
        Ok(Some(todo)) => Json(TodoResponse {
            success: true,
            message: message.to_string(),
            data: todo,
        })
        .into_response(),
        Ok(None) => not_found(id),
        Err(e) => storage_failure(StatusCode::BAD_REQUEST, context, e),
    }
}
