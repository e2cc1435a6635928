//! Session teardown.
//!
//! Every transport registered in the [`SessionRegistry`] gets a close
//! observer that evicts its session. Explicit termination and client
//! disconnects both go through [`McpTransport::close`], so eviction has a
//! single path.

use super::session::SessionRegistry;
use super::transport::McpTransport;
use std::sync::{Arc, Weak};
use tracing::info;

#[derive(Clone)]
pub struct LifecycleManager {
    registry: Arc<SessionRegistry>,
}

impl LifecycleManager {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Evict `token` from the registry when `transport` closes.
    ///
    /// The observer holds a weak reference: the registry owns the transport,
    /// and the transport owns the observer.
    pub fn attach(&self, token: &str, transport: &McpTransport) {
        let registry: Weak<SessionRegistry> = Arc::downgrade(&self.registry);
        let token = token.to_string();
        transport.on_close(move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            if registry.remove(&token).is_some() {
                info!("MCP: Session {} closed and removed", token);
            }
        });
    }

    /// Close every live session. Used on server shutdown so open push
    /// streams end and connections can drain.
    pub fn close_all(&self) -> usize {
        let transports = self.registry.transports();
        let count = transports.len();
        for transport in transports {
            transport.close();
        }
        if count > 0 {
            info!("MCP: Closed {} session(s) on shutdown", count);
        }
        count
    }
}
