//! Integration tests for the Minimart REST API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use minimart::create_app;
use minimart_types::api::{TodoListResponse, TodoResponse};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_ping() {
    let app = create_app();
    let (status, body) = send(&app, get("/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_index_page_is_served() {
    let app = create_app();
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html"
    );
}

#[tokio::test]
async fn test_openapi_document() {
    let app = create_app();
    let (status, body) = send(&app, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/todos"].is_object());
    assert!(body["paths"]["/minimarket/{kind}"].is_object());
}

#[tokio::test]
async fn test_todo_lifecycle() {
    let app = create_app();

    let (status, body) = send(
        &app,
        json_request("POST", "/todos", json!({"title": "Restock shelves", "user_id": "u1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: TodoResponse = serde_json::from_value(body).unwrap();
    assert!(created.success);
    assert_eq!(created.message, "Todo created successfully");
    assert!(!created.data.is_complete);
    let id = created.data.id;

    let (status, body) = send(&app, empty_request("PUT", &format!("/todos/{}/complete", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_complete"], true);

    let (status, body) = send(&app, get("/todos?user_id=u1&is_complete=true")).await;
    assert_eq!(status, StatusCode::OK);
    let list: TodoListResponse = serde_json::from_value(body).unwrap();
    assert_eq!(list.count, 1);
    assert_eq!(list.data[0].id, id);

    let (status, body) = send(&app, empty_request("PUT", &format!("/todos/{}/reopen", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_complete"], false);

    let (status, body) = send(
        &app,
        json_request("PUT", &format!("/todos/{}", id), json!({"title": "Restock dairy"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Restock dairy");

    let (status, body) = send(&app, empty_request("DELETE", &format!("/todos/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());

    let (status, _) = send(&app, get("/todos?user_id=u1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_todos_requires_user_id() {
    let app = create_app();
    let (status, body) = send(&app, get("/todos")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user_id is required");
}

#[tokio::test]
async fn test_create_todo_validation() {
    let app = create_app();

    let (status, body) = send(&app, json_request("POST", "/todos", json!({"title": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title and user_id are required");

    let (status, _) = send(
        &app,
        json_request("POST", "/todos", json!({"title": "  ", "user_id": "u1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_todo_cap_per_user() {
    let app = create_app();
    for i in 0..3 {
        let (status, _) = send(
            &app,
            json_request("POST", "/todos", json!({"title": format!("t{}", i), "user_id": "busy"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        json_request("POST", "/todos", json!({"title": "one more", "user_id": "busy"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Maximum of 3 todos per user reached. Delete an existing todo first."
    );

    // Another user is unaffected
    let (status, _) = send(
        &app,
        json_request("POST", "/todos", json!({"title": "mine", "user_id": "other"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_todo_is_not_found() {
    let app = create_app();
    for request in [
        empty_request("PUT", "/todos/not-a-uuid/complete"),
        empty_request("PUT", "/todos/00000000-0000-4000-8000-000000000000/reopen"),
        empty_request("DELETE", "/todos/00000000-0000-4000-8000-000000000000"),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Todo not found");
    }
}

#[tokio::test]
async fn test_minimarket_records() {
    let app = create_app();

    let (status, body) = send(&app, get("/minimarket/products")).await;
    assert_eq!(status, StatusCode::OK);
    let products = body.as_array().unwrap();
    assert!(!products.is_empty());

    let id = products[0]["id"].as_str().unwrap();
    let (status, body) = send(&app, get(&format!("/minimarket/products/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], products[0]["id"]);

    let (status, body) = send(&app, get("/minimarket/products/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    let (status, _) = send(&app, get("/minimarket/unicorns")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prompt_requires_prompt() {
    let app = create_app();
    let (status, body) = send(&app, json_request("POST", "/prompt", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Prompt is required"}));
}

#[tokio::test]
async fn test_prompt_without_api_key_fails() {
    let app = create_app();
    let (status, body) = send(&app, json_request("POST", "/prompt", json!({"prompt": "hi"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "GROQ API key not configured");
}
