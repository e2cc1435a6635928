//! MCP (Model Context Protocol) Streamable HTTP support.
//!
//! The HTTP surface is a single `/mcp` endpoint:
//!
//! - `POST /mcp` - Send JSON-RPC requests (returns JSON or SSE)
//! - `GET /mcp` - Open the SSE stream for server-initiated messages
//! - `DELETE /mcp` - Terminate a session
//!
//! In stateful mode sessions are identified by the `Mcp-Session-Id` header,
//! assigned on `initialize` and required for every later request. In
//! stateless mode each POST is served by a throwaway transport and GET
//! and DELETE answer 405.

pub mod classifier;
pub mod handler;
pub mod lifecycle;
pub mod router;
pub mod session;
pub mod tools;
pub mod transport;

pub use classifier::is_initialize_request;
pub use handler::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use lifecycle::LifecycleManager;
pub use router::{build_router, SessionRouter, StatefulRouter, StatelessRouter, TransportMode};
pub use session::{Session, SessionRegistry, SessionState};
pub use transport::{McpTransport, TransportError, MCP_SESSION_ID_HEADER};
