//! OpenAPI documentation configuration.

use minimart_types::api::{
    ErrorResponse, FailureResponse, PingResponse, PromptRequest, PromptResponse,
    TodoDeletedResponse, TodoListResponse, TodoNotFoundResponse, TodoResponse,
};
use minimart_types::catalog::{Brand, Category, Company, Product, Transaction, TransactionType};
use minimart_types::todo::{CreateTodoRequest, Todo, UpdateTodoRequest};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::todos::create_todo,
        crate::api::todos::list_todos,
        crate::api::todos::update_todo,
        crate::api::todos::complete_todo,
        crate::api::todos::reopen_todo,
        crate::api::todos::delete_todo,
        crate::api::minimarket::list_records,
        crate::api::minimarket::get_record,
        crate::api::prompt::send_prompt,
    ),
    components(
        schemas(
            Todo,
            CreateTodoRequest,
            UpdateTodoRequest,
            TodoResponse,
            TodoListResponse,
            TodoDeletedResponse,
            TodoNotFoundResponse,
            Company,
            Brand,
            Category,
            Product,
            Transaction,
            TransactionType,
            PromptRequest,
            PromptResponse,
            FailureResponse,
            ErrorResponse,
            PingResponse,
        )
    ),
    tags(
        (name = "todos", description = "Per-user todo management"),
        (name = "minimarket", description = "Minimarket master data"),
        (name = "prompt", description = "LLM prompt proxy")
    ),
    info(
        title = "Minimart API",
        version = "0.1.0",
        description = "REST surface of the Minimart MCP server. The MCP endpoint itself lives at /mcp and speaks JSON-RPC.",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
