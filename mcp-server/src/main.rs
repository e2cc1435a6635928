//! MCP server over stdio.
//!
//! Serves the same tool set as `POST /mcp`, one JSON-RPC message (or batch)
//! per line on stdin, one reply per line on stdout. Logs go to stderr so
//! they never interleave with protocol output.

use minimart::config::{Config, ConfigOverrides};
use minimart::mcp::handler::error_codes;
use minimart::mcp::{JsonRpcRequest, JsonRpcResponse, McpServer};
use minimart::state::AppState;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_figment(ConfigOverrides::default())?;
    let storage = config.storage.open().await?;
    let server = McpServer::new(AppState::with_storage(storage, config.llm));

    info!("MCP server started on stdio transport");
    serve(&server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!("stdin closed, exiting");
    Ok(())
}

/// Answer every line from `reader` until EOF.
async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = handle_line(server, &line).await {
            let mut out = serde_json::to_vec(&reply)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

/// Dispatch one line. Returns `None` when nothing needs to be written back.
async fn handle_line(server: &McpServer, line: &str) -> Option<Value> {
    let message: Value = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            warn!("Unparseable stdin line: {}", e);
            return to_value(JsonRpcResponse::error(
                None,
                error_codes::PARSE_ERROR,
                "Parse error: Invalid JSON",
            ));
        }
    };

    match message {
        Value::Array(batch) => {
            let mut replies = Vec::new();
            for message in batch {
                if let Some(reply) = handle_message(server, message).await {
                    replies.push(reply);
                }
            }
            (!replies.is_empty()).then_some(Value::Array(replies))
        }
        message => handle_message(server, message).await,
    }
}

async fn handle_message(server: &McpServer, message: Value) -> Option<Value> {
    // Responses to server-initiated requests carry no method
    if message.get("method").is_none() && message.get("id").is_some() {
        debug!("Ignoring client response on stdin");
        return None;
    }

    let id = message.get("id").cloned();
    match serde_json::from_value::<JsonRpcRequest>(message) {
        Ok(request) => server.handle_request(request).await.and_then(to_value),
        Err(e) => to_value(JsonRpcResponse::error(
            id,
            error_codes::INVALID_REQUEST,
            format!("Invalid Request: {}", e),
        )),
    }
}

fn to_value(response: JsonRpcResponse) -> Option<Value> {
    serde_json::to_value(response).ok()
}
