//! Shared types for the Minimart MCP server.
//!
//! This crate contains domain models and API types shared between
//! the HTTP backend and the stdio MCP server.

/// Default port for the Minimart backend server.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum number of live (non-deleted) todos a single user may own.
///
/// Completing a todo does not free a slot; only deletion does.
pub const MAX_TODOS_PER_USER: usize = 3;

pub mod api;
pub mod catalog;
pub mod events;
pub mod todo;

// Re-export commonly used types
pub use catalog::{Brand, Category, Company, Product, RecordKind, Transaction, TransactionType};
pub use events::TodoEvent;
pub use todo::{CreateTodoRequest, Todo, TodoFilter, TodoId, UpdateTodoRequest};
