//! End-to-end tests for the `/mcp` endpoint through the full application router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use minimart::create_app_with_router;
use minimart::mcp::{
    build_router, McpServer, SessionRegistry, SessionState, StatefulRouter, TransportMode,
    MCP_SESSION_ID_HEADER,
};
use minimart::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const ACCEPT_BOTH: &str = "application/json, text/event-stream";

fn initialize_body(id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "integration-test", "version": "1.0.0"}
        }
    })
}

fn stateful_app() -> (Router, Arc<SessionRegistry>) {
    let state = AppState::default();
    let registry = Arc::new(SessionRegistry::new());
    let router = Arc::new(StatefulRouter::with_registry(
        McpServer::new(state.clone()),
        registry.clone(),
    ));
    (create_app_with_router(state, router, Vec::new()), registry)
}

fn stateless_app() -> Router {
    let state = AppState::default();
    let router = build_router(TransportMode::Stateless, McpServer::new(state.clone()));
    create_app_with_router(state, router, Vec::new())
}

fn mcp_request(method: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/mcp")
        .header(header::ACCEPT, ACCEPT_BOTH);
    if let Some(token) = token {
        builder = builder.header(MCP_SESSION_ID_HEADER, token);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn session_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get(MCP_SESSION_ID_HEADER)
        .map(|v| v.to_str().unwrap().to_string())
}

async fn open_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(mcp_request("POST", None, Some(initialize_body(1))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_header(&response).expect("initialize response carries a session id")
}

#[tokio::test]
async fn test_initialize_creates_active_session() {
    let (app, registry) = stateful_app();

    let response = app
        .clone()
        .oneshot(mcp_request("POST", None, Some(initialize_body(1))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let token = session_header(&response).unwrap();
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.lookup(&token).unwrap().state(), SessionState::Active);
}

#[tokio::test]
async fn test_session_requests_reach_the_same_transport() {
    let (app, registry) = stateful_app();
    let token = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(mcp_request(
            "POST",
            Some(&token),
            Some(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session_header(&response).as_deref(), Some(token.as_str()));
    let body = body_json(response).await;
    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"create_todo"));
    assert!(names.contains(&"list_products"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_tool_call_over_session() {
    let (app, _registry) = stateful_app();
    let token = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(mcp_request(
            "POST",
            Some(&token),
            Some(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "create_todo",
                    "arguments": {"title": "Count stock", "user_id": "mcp-user"}
                }
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let result: Value = serde_json::from_str(text).unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["message"], "Todo created successfully");
}

#[tokio::test]
async fn test_missing_token_without_initialize_is_rejected() {
    let (app, registry) = stateful_app();

    let response = app
        .oneshot(mcp_request(
            "POST",
            None,
            Some(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32000);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_get_with_unknown_token_is_plain_text_400() {
    let (app, registry) = stateful_app();

    let response = app
        .oneshot(mcp_request("GET", Some("no-such-session"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body_bytes(response).await, b"Invalid or missing session ID");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_delete_closes_session() {
    let (app, registry) = stateful_app();
    let token = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(mcp_request("DELETE", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!registry.contains(&token));

    let response = app
        .clone()
        .oneshot(mcp_request("GET", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_push_stream_disconnect_closes_session() {
    let (app, registry) = stateful_app();
    let token = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(mcp_request("GET", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    assert!(registry.contains(&token));

    drop(response);
    assert!(!registry.contains(&token));
}

#[tokio::test]
async fn test_stateless_concurrent_requests_are_independent() {
    let app = stateless_app();
    let call = || {
        mcp_request(
            "POST",
            None,
            Some(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "generate_user_id", "arguments": {}}
            })),
        )
    };

    let (first, second) = tokio::join!(app.clone().oneshot(call()), app.clone().oneshot(call()));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert!(session_header(&first).is_none());
    assert!(session_header(&second).is_none());

    let user_id = |body: Value| -> String {
        let text = body["result"]["content"][0]["text"].as_str().unwrap().to_string();
        let result: Value = serde_json::from_str(&text).unwrap();
        result["user_id"].as_str().unwrap().to_string()
    };
    let a = user_id(body_json(first).await);
    let b = user_id(body_json(second).await);
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_stateless_get_and_delete_not_allowed() {
    let app = stateless_app();
    for method in ["GET", "DELETE"] {
        let response = app
            .clone()
            .oneshot(mcp_request(method, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

#[tokio::test]
async fn test_cors_exposes_session_header() {
    let (app, _registry) = stateful_app();
    let mut request = mcp_request("POST", None, Some(initialize_body(1)));
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:5173".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    let exposed = response
        .headers()
        .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains(MCP_SESSION_ID_HEADER));
}
