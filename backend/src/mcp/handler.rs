//! MCP JSON-RPC request handler.
//!
//! Handles MCP protocol methods and dispatches tool calls against AppState.

use super::tools::{self, ToolCallError};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Latest MCP protocol version we support.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Protocol versions a client may negotiate during `initialize`.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[PROTOCOL_VERSION, "2024-11-05"];

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "MCP Todos Server";

/// JSON-RPC error codes used by the server.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Generic server error, used for transport-level rejections
    pub const SERVER_ERROR: i32 = -32000;
}

/// JSON-RPC 2.0 Request (or notification when `id` is absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no `id` and expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Build a server-initiated notification.
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params: Some(params),
        }
    }
}

/// JSON-RPC 2.0 Response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 Error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool call parameters from MCP.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// MCP protocol server: answers JSON-RPC requests independent of transport.
#[derive(Clone)]
pub struct McpServer {
    state: AppState,
}

impl McpServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle an MCP JSON-RPC request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        debug!("MCP: Handling method: {}", request.method);

        let response = match request.method.as_str() {
            "initialize" => Self::handle_initialize(id, request.params.as_ref()),
            "notifications/initialized" | "initialized" | "notifications/cancelled" => {
                return None;
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tools::definitions() })),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            method => {
                if request.id.is_none() {
                    debug!("MCP: Ignoring unknown notification: {}", method);
                    return None;
                }
                JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                )
            }
        };

        // Notifications never get a response, even on error
        if request.id.is_none() {
            return None;
        }
        Some(response)
    }

    /// Handle the initialize request.
    ///
    /// Echoes the client's protocol version when we support it, otherwise
    /// answers with the latest one.
    fn handle_initialize(id: Option<Value>, params: Option<&Value>) -> JsonRpcResponse {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v) => v,
            Some(v) => {
                debug!("MCP: Client requested unsupported protocol version {}", v);
                PROTOCOL_VERSION
            }
            None => PROTOCOL_VERSION,
        };

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": version,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params.unwrap_or(json!({}))) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid tool call params: {}", e),
                )
            }
        };

        let arguments = params.arguments.unwrap_or(json!({}));
        match tools::call(&self.state, &params.name, arguments).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(ToolCallError::UnknownTool(name)) => {
                warn!("MCP: Unknown tool requested: {}", name);
                JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Tool {} not found", name),
                )
            }
        }
    }
}
