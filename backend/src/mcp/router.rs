//! Request routing for the `/mcp` endpoint.
//!
//! A [`SessionRouter`] decides, for each HTTP request, which transport
//! handles it. The stateful router keys transports by the `mcp-session-id`
//! header through the [`SessionRegistry`]; the stateless router builds a
//! fresh transport per POST. The mode is fixed when the router is built.

use super::classifier::is_initialize_request;
use super::handler::{error_codes, JsonRpcResponse, McpServer};
use super::lifecycle::LifecycleManager;
use super::session::{new_session_token, Session, SessionRegistry, SessionState};
use super::transport::{McpTransport, TransportError, MCP_SESSION_ID_HEADER};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How `/mcp` requests are mapped onto transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Sessions persist across requests, keyed by `mcp-session-id`
    #[default]
    Stateful,
    /// One throwaway transport per POST; no GET or DELETE
    Stateless,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Stateful => "stateful",
            TransportMode::Stateless => "stateless",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stateful" => Ok(TransportMode::Stateful),
            "stateless" => Ok(TransportMode::Stateless),
            other => Err(format!(
                "Unknown transport mode '{}', expected 'stateful' or 'stateless'",
                other
            )),
        }
    }
}

/// HTTP-facing dispatcher for `/mcp`.
#[async_trait]
pub trait SessionRouter: Send + Sync {
    fn mode(&self) -> TransportMode;

    /// Handle `POST /mcp`.
    async fn post(&self, headers: HeaderMap, body: Bytes) -> Response;

    /// Handle `GET /mcp`.
    async fn get(&self, headers: HeaderMap) -> Response;

    /// Handle `DELETE /mcp`.
    async fn delete(&self, headers: HeaderMap) -> Response;

    /// Release every live transport. Called once at shutdown.
    fn shutdown(&self) {}
}

/// Build the router for `mode`.
pub fn build_router(mode: TransportMode, server: McpServer) -> Arc<dyn SessionRouter> {
    match mode {
        TransportMode::Stateful => Arc::new(StatefulRouter::new(server)),
        TransportMode::Stateless => Arc::new(StatelessRouter::new(server)),
    }
}

/// Extract the session token from request headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Rejection for a POST that neither names a live session nor initializes one.
fn no_valid_session() -> Response {
    let body = JsonRpcResponse::error(
        None,
        error_codes::SERVER_ERROR,
        "Bad Request: No valid session ID provided",
    );
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Rejection for GET/DELETE without a live session.
fn invalid_session() -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Invalid or missing session ID",
    )
        .into_response()
}

/// Generic failure while forwarding to a transport.
fn internal_error() -> Response {
    let body = JsonRpcResponse::error(None, error_codes::INTERNAL_ERROR, "Internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn transport_error(error: TransportError, session: Option<&str>) -> Response {
    match &error {
        TransportError::Closed => {
            error!("MCP: Transport closed while forwarding for session {:?}", session)
        }
        other => warn!("MCP: Request rejected for session {:?}: {}", session, other),
    }
    error.into_response()
}

/// Router keeping one transport per session.
pub struct StatefulRouter {
    server: McpServer,
    lifecycle: LifecycleManager,
}

impl StatefulRouter {
    pub fn new(server: McpServer) -> Self {
        Self::with_registry(server, Arc::new(SessionRegistry::new()))
    }

    pub fn with_registry(server: McpServer, registry: Arc<SessionRegistry>) -> Self {
        Self {
            server,
            lifecycle: LifecycleManager::new(registry),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.lifecycle.registry()
    }

    /// Registry lookup that treats a closing transport as already gone.
    fn live_session(&self, token: &str) -> Option<Session> {
        self.registry()
            .lookup(token)
            .filter(|session| session.state() != SessionState::Closed)
    }

    /// Create, register and initialize a new session.
    async fn initialize(&self, headers: &HeaderMap, body: &[u8]) -> Response {
        let token = new_session_token();
        let transport = McpTransport::stateful(self.server.clone(), token.as_str());

        if !self.registry().insert(Session::new(token.as_str(), transport.clone())) {
            error!("MCP: Session token collision for {}", token);
            return internal_error();
        }
        self.lifecycle.attach(&token, &transport);

        match transport.handle_post(headers, body).await {
            Ok(response) => {
                self.registry().mark_active(&token);
                info!("MCP: New session initialized: {}", token);
                response
            }
            Err(e) => {
                transport.close();
                transport_error(e, Some(&token))
            }
        }
    }
}

#[async_trait]
impl SessionRouter for StatefulRouter {
    fn mode(&self) -> TransportMode {
        TransportMode::Stateful
    }

    async fn post(&self, headers: HeaderMap, body: Bytes) -> Response {
        let token = session_token(&headers);
        debug!("MCP POST: session={:?}", token);

        match token {
            Some(token) => match self.live_session(&token) {
                Some(session) => match session.transport().handle_post(&headers, &body).await {
                    Ok(response) => response,
                    Err(e) => transport_error(e, Some(&token)),
                },
                None => {
                    debug!("MCP: Unknown session {}", token);
                    no_valid_session()
                }
            },
            None if is_initialize_request(&body) => self.initialize(&headers, &body).await,
            None => no_valid_session(),
        }
    }

    async fn get(&self, headers: HeaderMap) -> Response {
        let Some(token) = session_token(&headers) else {
            return invalid_session();
        };
        let Some(session) = self.live_session(&token) else {
            debug!("MCP GET: Unknown session {}", token);
            return invalid_session();
        };
        session
            .transport()
            .handle_get(&headers)
            .unwrap_or_else(|e| transport_error(e, Some(&token)))
    }

    async fn delete(&self, headers: HeaderMap) -> Response {
        let Some(token) = session_token(&headers) else {
            return invalid_session();
        };
        let Some(session) = self.live_session(&token) else {
            debug!("MCP DELETE: Unknown session {}", token);
            return invalid_session();
        };
        info!("MCP: Terminating session {}", token);
        session
            .transport()
            .handle_delete()
            .unwrap_or_else(|e| transport_error(e, Some(&token)))
    }

    fn shutdown(&self) {
        self.lifecycle.close_all();
    }
}

/// Router creating a single-use transport for every POST.
pub struct StatelessRouter {
    server: McpServer,
}

impl StatelessRouter {
    pub fn new(server: McpServer) -> Self {
        Self { server }
    }
}

#[async_trait]
impl SessionRouter for StatelessRouter {
    fn mode(&self) -> TransportMode {
        TransportMode::Stateless
    }

    async fn post(&self, headers: HeaderMap, body: Bytes) -> Response {
        let transport = McpTransport::stateless(self.server.clone());
        match transport.handle_post(&headers, &body).await {
            Ok(response) => transport.close_with_response(response),
            Err(e) => {
                transport.close();
                transport_error(e, None)
            }
        }
    }

    async fn get(&self, _headers: HeaderMap) -> Response {
        TransportError::MethodNotAllowed.into_response()
    }

    async fn delete(&self, _headers: HeaderMap) -> Response {
        TransportError::MethodNotAllowed.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;
    use serde_json::{json, Value};

    fn initialize_body() -> Bytes {
        Bytes::from(
            serde_json::to_vec(&json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "router-test", "version": "0.1.0"}
                }
            }))
            .unwrap(),
        )
    }

    fn with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(MCP_SESSION_ID_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn stateful() -> StatefulRouter {
        StatefulRouter::new(McpServer::new(AppState::default()))
    }

    async fn open_session(router: &StatefulRouter) -> String {
        let response = router.post(HeaderMap::new(), initialize_body()).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.headers()[MCP_SESSION_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_transport_mode_parsing() {
        assert_eq!("Stateless".parse::<TransportMode>(), Ok(TransportMode::Stateless));
        assert_eq!(" stateful ".parse::<TransportMode>(), Ok(TransportMode::Stateful));
        assert!("sticky".parse::<TransportMode>().is_err());
        assert_eq!(TransportMode::default(), TransportMode::Stateful);
    }

    #[tokio::test]
    async fn test_initialize_registers_active_session() {
        let router = stateful();
        let token = open_session(&router).await;
        let session = router.registry().lookup(&token).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(router.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_non_initialize_without_token_is_rejected() {
        let router = stateful();
        let response = router
            .post(
                HeaderMap::new(),
                Bytes::from_static(br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["error"]["message"], "Bad Request: No valid session ID provided");
        assert_eq!(body["id"], Value::Null);
        assert!(router.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token_never_creates_a_session() {
        let router = stateful();
        let headers = with_token("not-a-session");

        let response = router.post(headers.clone(), initialize_body()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router.get(headers.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Invalid or missing session ID");

        let response = router.delete(headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(router.registry().is_empty());
    }

    #[tokio::test]
    async fn test_requests_reuse_session_transport() {
        let router = stateful();
        let token = open_session(&router).await;

        let response = router
            .post(
                with_token(&token),
                Bytes::from_static(br#"{"jsonrpc":"2.0","id":5,"method":"tools/list"}"#),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[MCP_SESSION_ID_HEADER], token.as_str());
        let body = body_json(response).await;
        assert!(body["result"]["tools"].is_array());
        assert_eq!(router.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_evicts_and_later_requests_fail() {
        let router = stateful();
        let token = open_session(&router).await;

        let response = router.delete(with_token(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!router.registry().contains(&token));

        let response = router.get(with_token(&token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = router.delete(with_token(&token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dropped_push_stream_evicts_session() {
        let router = stateful();
        let token = open_session(&router).await;

        let response = router.get(with_token(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let second = router.get(with_token(&token)).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);

        drop(response);
        assert!(!router.registry().contains(&token));
    }

    #[tokio::test]
    async fn test_concurrent_initializations_create_distinct_sessions() {
        let router = Arc::new(stateful());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let router = router.clone();
                tokio::spawn(async move { open_session(&router).await })
            })
            .collect();

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap());
        }
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 8);
        assert_eq!(router.registry().len(), 8);
    }

    #[tokio::test]
    async fn test_shutdown_closes_all_sessions() {
        let router = stateful();
        open_session(&router).await;
        open_session(&router).await;
        router.shutdown();
        assert!(router.registry().is_empty());
    }

    #[tokio::test]
    async fn test_stateless_router_ignores_session_header() {
        let router = StatelessRouter::new(McpServer::new(AppState::default()));
        assert_eq!(router.mode(), TransportMode::Stateless);

        let response = router
            .post(
                with_token("whatever"),
                Bytes::from_static(br#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(MCP_SESSION_ID_HEADER).is_none());
        let body = body_json(response).await;
        assert_eq!(body["id"], 3);

        let response = router.get(HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_initialize_echoes_supported_protocol_version() {
        let router = stateful();
        let body = serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "router-test", "version": "0.1.0"}
            }
        }))
        .unwrap();

        let response = router.post(HeaderMap::new(), Bytes::from(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_forwarding_to_closing_transport_is_internal_error() {
        let router = stateful();
        let token = open_session(&router).await;
        let session = router.registry().lookup(&token).unwrap();

        session.transport().close();
        let err = session
            .transport()
            .handle_post(&with_token(&token), br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#)
            .await
            .unwrap_err();

        let response = transport_error(err, Some(&token));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], error_codes::INTERNAL_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(!router.registry().contains(&token));
    }
}
