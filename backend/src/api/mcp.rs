//! MCP Streamable HTTP endpoint handlers.
//!
//! Thin axum adapters over the configured [`SessionRouter`]:
//!
//! - `POST /mcp` - Send JSON-RPC requests (returns JSON or SSE)
//! - `GET /mcp` - Open SSE stream for server-initiated messages
//! - `DELETE /mcp` - Terminate a session
//!
//! In stateless mode GET and DELETE answer 405.

use axum::{body::Bytes, http::HeaderMap, response::Response, Extension};
use std::sync::Arc;

use crate::mcp::SessionRouter;

/// The router shared by all `/mcp` handlers.
pub type SharedSessionRouter = Arc<dyn SessionRouter>;

/// POST /mcp - Handle JSON-RPC requests.
///
/// A request without `Mcp-Session-Id` must be an `initialize` request; the
/// response then carries the new session ID.
pub async fn mcp_post(
    Extension(router): Extension<SharedSessionRouter>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    router.post(headers, body).await
}

/// GET /mcp - Open SSE stream for server-initiated messages.
pub async fn mcp_get(
    Extension(router): Extension<SharedSessionRouter>,
    headers: HeaderMap,
) -> Response {
    router.get(headers).await
}

/// DELETE /mcp - Terminate a session.
pub async fn mcp_delete(
    Extension(router): Extension<SharedSessionRouter>,
    headers: HeaderMap,
) -> Response {
    router.delete(headers).await
}
