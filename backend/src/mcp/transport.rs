//! Transport handle for the MCP Streamable HTTP protocol.
//!
//! An [`McpTransport`] carries JSON-RPC traffic for one session (stateful
//! mode) or for a single request (stateless mode). It turns POST bodies into
//! JSON or SSE replies, owns the optional standalone push stream opened by
//! GET, and exposes a close notification that fires exactly once.

use super::handler::{error_codes, JsonRpcRequest, JsonRpcResponse, McpServer};
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use minimart_types::TodoEvent;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Header carrying the session token.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Interval between SSE keep-alive comments on push streams.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Failures while forwarding a request to a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport closed while a request was being forwarded to it.
    #[error("Internal server error")]
    Closed,

    #[error("Parse error: Invalid JSON")]
    Parse,

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Bad Request: Server not initialized")]
    NotInitialized,

    #[error("Invalid Request: Server already initialized")]
    AlreadyInitialized,

    #[error("Conflict: Only one SSE stream is allowed per session")]
    StreamConflict,

    #[error("Not Acceptable: Client must accept text/event-stream")]
    NotAcceptable,

    #[error("Method not allowed.")]
    MethodNotAllowed,
}

impl TransportError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::Closed => StatusCode::INTERNAL_SERVER_ERROR,
            TransportError::Parse
            | TransportError::InvalidRequest(_)
            | TransportError::NotInitialized
            | TransportError::AlreadyInitialized => StatusCode::BAD_REQUEST,
            TransportError::StreamConflict => StatusCode::CONFLICT,
            TransportError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            TransportError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// JSON-RPC error code reported in the response body.
    pub fn code(&self) -> i32 {
        match self {
            TransportError::Closed => error_codes::INTERNAL_ERROR,
            TransportError::Parse => error_codes::PARSE_ERROR,
            TransportError::InvalidRequest(_) | TransportError::AlreadyInitialized => {
                error_codes::INVALID_REQUEST
            }
            TransportError::NotInitialized
            | TransportError::StreamConflict
            | TransportError::NotAcceptable
            | TransportError::MethodNotAllowed => error_codes::SERVER_ERROR,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let body = JsonRpcResponse::error(None, self.code(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

type CloseObserver = Box<dyn FnOnce() + Send>;

/// Handle to one MCP channel. Cloning shares the same channel.
#[derive(Clone)]
pub struct McpTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    server: McpServer,
    /// `None` in stateless mode
    session_id: Option<String>,
    initialized: AtomicBool,
    closed: CancellationToken,
    /// Pending close observers; `None` once the transport has closed
    observers: Mutex<Option<Vec<CloseObserver>>>,
    /// Sender feeding the standalone push stream, if one is open
    push: Mutex<Option<mpsc::UnboundedSender<Value>>>,
}

impl McpTransport {
    /// Create a transport bound to a session token.
    pub fn stateful(server: McpServer, session_id: impl Into<String>) -> Self {
        Self::new(server, Some(session_id.into()))
    }

    /// Create a single-use transport with no session.
    pub fn stateless(server: McpServer) -> Self {
        Self::new(server, None)
    }

    fn new(server: McpServer, session_id: Option<String>) -> Self {
        Self {
            inner: Arc::new(TransportInner {
                server,
                session_id,
                initialized: AtomicBool::new(false),
                closed: CancellationToken::new(),
                observers: Mutex::new(Some(Vec::new())),
                push: Mutex::new(None),
            }),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.inner.session_id.as_deref()
    }

    pub fn is_stateful(&self) -> bool {
        self.inner.session_id.is_some()
    }

    /// Whether an `initialize` request has been accepted.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Resolves once the transport has closed.
    pub async fn closed(&self) {
        self.inner.closed.cancelled().await
    }

    /// Register a one-shot observer invoked on the first [`close`](Self::close).
    ///
    /// Observers registered after the transport closed run immediately.
    pub fn on_close<F>(&self, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut observers = self.inner.observers.lock();
        if let Some(pending) = observers.as_mut() {
            pending.push(Box::new(observer));
            return;
        }
        drop(observers);
        observer();
    }

    /// Close the transport. Only the first call has any effect.
    ///
    /// Observers run synchronously on the calling task, after the transport
    /// already reports itself closed.
    pub fn close(&self) {
        let Some(observers) = self.inner.observers.lock().take() else {
            return;
        };
        self.inner.closed.cancel();
        self.inner.push.lock().take();

        match self.session_id() {
            Some(id) => info!("MCP: Transport closed for session {}", id),
            None => debug!("MCP: Stateless transport closed"),
        }

        for observer in observers {
            observer();
        }
    }

    /// Push a server-initiated message onto the open push stream.
    ///
    /// Returns `false` when no push stream is open or the transport closed.
    pub fn send(&self, message: Value) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.inner.push.lock().as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Handle a POST body carrying one JSON-RPC message or a batch.
    pub async fn handle_post(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let ParsedBody { requests, batch } = parse_body(body)?;

        let has_initialize = requests.iter().any(|r| r.method == "initialize");
        if has_initialize && requests.len() > 1 {
            return Err(TransportError::InvalidRequest(
                "Only one initialization request is allowed".to_string(),
            ));
        }
        if self.is_stateful() {
            if has_initialize {
                if self.inner.initialized.swap(true, Ordering::AcqRel) {
                    return Err(TransportError::AlreadyInitialized);
                }
            } else if !self.is_initialized() {
                return Err(TransportError::NotInitialized);
            }
        }

        let mut responses = Vec::new();
        for request in requests {
            if let Some(response) = self.inner.server.handle_request(request).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            return Ok(self.with_session_header(StatusCode::ACCEPTED.into_response()));
        }

        let response = if wants_event_stream(headers) {
            let events: Vec<Result<Event, Infallible>> =
                responses.iter().map(|r| Ok(message_event(r))).collect();
            Sse::new(tokio_stream::iter(events)).into_response()
        } else if batch {
            Json(responses).into_response()
        } else {
            Json(responses.swap_remove(0)).into_response()
        };

        Ok(self.with_session_header(response))
    }

    /// Open the standalone server-push stream for this session.
    ///
    /// The stream carries messages passed to [`send`](Self::send) and todo
    /// change notifications. It ends when the transport closes, and the
    /// transport closes when the client drops the stream.
    pub fn handle_get(&self, headers: &HeaderMap) -> Result<Response, TransportError> {
        if !self.is_stateful() {
            return Err(TransportError::MethodNotAllowed);
        }
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if !accepts_event_stream(headers) {
            return Err(TransportError::NotAcceptable);
        }

        let rx = {
            let mut push = self.inner.push.lock();
            if push.as_ref().is_some_and(|tx| !tx.is_closed()) {
                return Err(TransportError::StreamConflict);
            }
            let (tx, rx) = mpsc::unbounded_channel();
            *push = Some(tx);
            rx
        };

        let session_stream = UnboundedReceiverStream::new(rx)
            .map(|message| Ok::<_, Infallible>(message_event(&message)));

        let todo_stream = BroadcastStream::new(self.inner.server.state().events().subscribe())
            .filter_map(|result| match result {
                Ok(event) => Some(Ok::<_, Infallible>(message_event(&todo_notification(&event)))),
                Err(e) => {
                    warn!("MCP: Push stream skipped todo events: {}", e);
                    None
                }
            });

        let merged = futures::StreamExt::take_until(
            session_stream.merge(todo_stream),
            self.inner.closed.clone().cancelled_owned(),
        );
        let stream = Guarded::new(merged, CloseOnDrop::new(self.clone()));

        if let Some(id) = self.session_id() {
            info!("MCP: SSE stream opened for session {}", id);
        }

        let response = Sse::new(stream)
            .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
            .into_response();
        Ok(self.with_session_header(response))
    }

    /// Terminate the session.
    pub fn handle_delete(&self) -> Result<Response, TransportError> {
        if !self.is_stateful() {
            return Err(TransportError::MethodNotAllowed);
        }
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.close();
        Ok(StatusCode::OK.into_response())
    }

    /// Tie the transport to a response body: it closes when the body is
    /// dropped, whether or not the client read all of it.
    pub fn close_with_response(&self, response: Response) -> Response {
        let guard = CloseOnDrop::new(self.clone());
        response.map(|body| Body::from_stream(Guarded::new(body.into_data_stream(), guard)))
    }

    fn with_session_header(&self, mut response: Response) -> Response {
        if let Some(id) = self.session_id() {
            if let Ok(value) = HeaderValue::from_str(id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(MCP_SESSION_ID_HEADER), value);
            }
        }
        response
    }
}

impl fmt::Debug for McpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpTransport")
            .field("session_id", &self.inner.session_id)
            .field("initialized", &self.is_initialized())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Closes the transport when dropped.
pub struct CloseOnDrop(McpTransport);

impl CloseOnDrop {
    pub fn new(transport: McpTransport) -> Self {
        Self(transport)
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// A stream that keeps a [`CloseOnDrop`] alive for as long as it is polled.
struct Guarded<S> {
    stream: Pin<Box<S>>,
    _guard: CloseOnDrop,
}

impl<S> Guarded<S> {
    fn new(stream: S, guard: CloseOnDrop) -> Self {
        Self {
            stream: Box::pin(stream),
            _guard: guard,
        }
    }
}

impl<S: Stream> Stream for Guarded<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}

struct ParsedBody {
    requests: Vec<JsonRpcRequest>,
    batch: bool,
}

/// Split a POST body into requests and notifications.
///
/// Client responses (to server-initiated requests) are accepted and dropped.
fn parse_body(body: &[u8]) -> Result<ParsedBody, TransportError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("MCP: Rejecting unparseable body: {}", e);
        TransportError::Parse
    })?;

    let (items, batch) = match value {
        Value::Array(items) => (items, true),
        other => (vec![other], false),
    };
    if items.is_empty() {
        return Err(TransportError::InvalidRequest("Empty batch".to_string()));
    }

    let mut requests = Vec::with_capacity(items.len());
    for item in items {
        if item.get("method").is_some() {
            let request: JsonRpcRequest = serde_json::from_value(item)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            if request.jsonrpc != "2.0" {
                return Err(TransportError::InvalidRequest(
                    "jsonrpc must be \"2.0\"".to_string(),
                ));
            }
            requests.push(request);
        } else if item.get("result").is_some() || item.get("error").is_some() {
            debug!("MCP: Dropping client response for id {:?}", item.get("id"));
        } else {
            return Err(TransportError::InvalidRequest(
                "Not a JSON-RPC message".to_string(),
            ));
        }
    }

    Ok(ParsedBody { requests, batch })
}

/// Replies go out as SSE only when the client accepts event streams but not JSON.
fn wants_event_stream(headers: &HeaderMap) -> bool {
    let accepted = accepted_media_types(headers).unwrap_or_default();
    accepted.iter().any(|t| t == "text/event-stream")
        && !accepted.iter().any(|t| t == "application/json")
}

/// A missing Accept header accepts anything.
fn accepts_event_stream(headers: &HeaderMap) -> bool {
    match accepted_media_types(headers) {
        None => true,
        Some(accepted) => accepted
            .iter()
            .any(|t| matches!(t.as_str(), "text/event-stream" | "text/*" | "*/*")),
    }
}

/// Media ranges from the Accept header, lowercased, without parameters.
/// Ranges weighted `q=0` are refused by the client and left out.
fn accepted_media_types(headers: &HeaderMap) -> Option<Vec<String>> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;

    let types = accept
        .split(',')
        .filter_map(|range| {
            let mut parts = range.split(';');
            let media_type = parts.next()?.trim().to_ascii_lowercase();
            let refused = parts.any(|param| {
                let Some((name, value)) = param.split_once('=') else {
                    return false;
                };
                name.trim().eq_ignore_ascii_case("q")
                    && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
            });
            (!media_type.is_empty() && !refused).then_some(media_type)
        })
        .collect();
    Some(types)
}

fn message_event<T: Serialize>(message: &T) -> Event {
    Event::default()
        .event("message")
        .data(serde_json::to_string(message).unwrap_or_default())
}

/// Render a todo change as a JSON-RPC notification.
fn todo_notification(event: &TodoEvent) -> JsonRpcRequest {
    JsonRpcRequest::notification(
        event.notification_method(),
        json!({
            "todo_id": event.todo_id().to_string(),
            "user_id": event.user_id(),
            "description": event.description()
        }),
    )
}
