//! Recognition of MCP `initialize` requests.
//!
//! Only an initialization request may create a session, so the check is
//! strict: the message must be a well-formed JSON-RPC 2.0 request whose
//! params carry the fields every MCP client sends during the handshake.
//! Anything else, including batches and malformed JSON, is not an
//! initialization request.

use serde_json::Value;

/// Returns `true` when the raw body is a single MCP `initialize` request.
pub fn is_initialize_request(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .map(|message| is_initialize_message(&message))
        .unwrap_or(false)
}

/// Same check as [`is_initialize_request`] on an already parsed message.
pub fn is_initialize_message(message: &Value) -> bool {
    let Some(object) = message.as_object() else {
        return false;
    };

    if object.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return false;
    }
    if object.get("method").and_then(Value::as_str) != Some("initialize") {
        return false;
    }
    if !matches!(object.get("id"), Some(Value::String(_) | Value::Number(_))) {
        return false;
    }

    let Some(params) = object.get("params").and_then(Value::as_object) else {
        return false;
    };
    let has_version = params
        .get("protocolVersion")
        .is_some_and(Value::is_string);
    let has_capabilities = params.get("capabilities").is_some_and(Value::is_object);
    let has_client_info = params
        .get("clientInfo")
        .and_then(Value::as_object)
        .is_some_and(|info| {
            info.get("name").is_some_and(Value::is_string)
                && info.get("version").is_some_and(Value::is_string)
        });

    has_version && has_capabilities && has_client_info
}
