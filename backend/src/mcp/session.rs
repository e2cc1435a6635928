//! MCP session registry.
//!
//! Maps session tokens to the transport serving that session. Entries are
//! added by the stateful router after a successful handshake check and
//! removed only by the close observer the lifecycle manager attaches.

use super::transport::McpTransport;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Registered, initialization response not yet produced
    Initializing,
    /// Initialization answered; further requests are forwarded
    Active,
    /// Transport closed. Terminal.
    Closed,
}

/// One registered session.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    transport: McpTransport,
    state: SessionState,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, transport: McpTransport) -> Self {
        Self {
            token: token.into(),
            transport,
            state: SessionState::Initializing,
            created_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn transport(&self) -> &McpTransport {
        &self.transport
    }

    /// Current state. A closed transport always reports [`SessionState::Closed`].
    pub fn state(&self) -> SessionState {
        if self.transport.is_closed() {
            SessionState::Closed
        } else {
            self.state
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Generate a fresh, unguessable session token.
pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Process-wide mapping from session token to [`Session`].
///
/// A single lock guards the map, so `lookup`, `insert` and `remove` are
/// atomic with respect to each other.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session by token.
    pub fn lookup(&self, token: &str) -> Option<Session> {
        self.sessions.read().get(token).cloned()
    }

    /// Register a session. Returns `false` and leaves the registry untouched
    /// if the token is already taken.
    pub fn insert(&self, session: Session) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.token) {
            warn!("MCP: Refusing to reuse session token {}", session.token);
            return false;
        }
        debug!("MCP: Registered session {}", session.token);
        sessions.insert(session.token.clone(), session);
        true
    }

    /// Remove a session. Removing an unknown token is a no-op.
    pub fn remove(&self, token: &str) -> Option<Session> {
        let removed = self.sessions.write().remove(token);
        if removed.is_some() {
            debug!("MCP: Removed session {}", token);
        }
        removed
    }

    /// Move a session from `Initializing` to `Active`.
    pub fn mark_active(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(token) {
            Some(session) if session.state == SessionState::Initializing => {
                session.state = SessionState::Active;
                debug!("MCP: Session {} is active", token);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.sessions.read().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Snapshot of all live transports, used to close them at shutdown.
    pub(crate) fn transports(&self) -> Vec<McpTransport> {
        self.sessions
            .read()
            .values()
            .map(|session| session.transport.clone())
            .collect()
    }
}
