//! Minimart backend library.
//!
//! This module exposes the application builder for use in tests.

use axum::http::HeaderValue;
use axum::http::{header, HeaderName, Method};
use axum::{
    routing::{get, post, put},
    Extension, Json, Router,
};
use minimart_types::api::PingResponse;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub mod api;
pub mod assets;
pub mod catalog;
pub mod config;
pub mod events;
pub mod llm;
pub mod mcp;
pub mod openapi;
pub mod paths;
pub mod state;
pub mod storage;

use api::mcp::SharedSessionRouter;
use mcp::{build_router, McpServer, TransportMode, MCP_SESSION_ID_HEADER};
use state::AppState;

/// Create the Axum application router.
///
/// This function is used both by the main server binary and by integration tests.
pub fn create_app() -> Router {
    create_app_with_state(AppState::default())
}

/// Create the Axum application router with a given state, in stateful mode.
pub fn create_app_with_state(state: AppState) -> Router {
    create_app_with_config(state, TransportMode::Stateful, Vec::new())
}

/// Create the Axum application router with a given state, transport mode, and CORS origins.
pub fn create_app_with_config(
    state: AppState,
    mode: TransportMode,
    cors_allowed_origins: Vec<String>,
) -> Router {
    let mcp_router = build_router(mode, McpServer::new(state.clone()));
    create_app_with_router(state, mcp_router, cors_allowed_origins)
}

/// Create the Axum application router around an existing `/mcp` session router.
///
/// The caller keeps its handle to `mcp_router` so it can shut sessions down.
/// If `cors_allowed_origins` is empty, any origin is allowed.
/// Otherwise, only the specified origins are allowed.
pub fn create_app_with_router(
    state: AppState,
    mcp_router: SharedSessionRouter,
    cors_allowed_origins: Vec<String>,
) -> Router {
    tracing::info!("MCP endpoint mounted at /mcp ({} mode)", mcp_router.mode());

    let mcp_routes = Router::new().route(
        "/mcp",
        post(api::mcp::mcp_post)
            .get(api::mcp::mcp_get)
            .delete(api::mcp::mcp_delete),
    );

    let todo_routes = Router::new()
        .route(
            "/todos",
            post(api::todos::create_todo).get(api::todos::list_todos),
        )
        .route(
            "/todos/{id}",
            put(api::todos::update_todo).delete(api::todos::delete_todo),
        )
        .route("/todos/{id}/complete", put(api::todos::complete_todo))
        .route("/todos/{id}/reopen", put(api::todos::reopen_todo));

    let minimarket_routes = Router::new()
        .route("/minimarket/{kind}", get(api::minimarket::list_records))
        .route("/minimarket/{kind}/{id}", get(api::minimarket::get_record));

    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/prompt", post(api::prompt::send_prompt))
        .merge(mcp_routes)
        .merge(todo_routes)
        .merge(minimarket_routes)
        .layer(Extension(mcp_router))
        .layer(TraceLayer::new_for_http())
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::AUTHORIZATION,
                    HeaderName::from_static(MCP_SESSION_ID_HEADER),
                ])
                .expose_headers([HeaderName::from_static(MCP_SESSION_ID_HEADER)]);

            // If no origins specified, allow any origin
            // Otherwise, restrict to the specified origins
            if cors_allowed_origins.is_empty() {
                cors.allow_origin(Any)
            } else {
                let origins: Vec<HeaderValue> = cors_allowed_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins).allow_credentials(true)
            }
        })
        .with_state(state)
        // Serve the embedded index page for all other routes
        .fallback(assets::serve_static)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

/// Liveness endpoint kept for clients that poll `/ping`.
async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}
