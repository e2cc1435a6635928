//! API handlers.

pub mod mcp;
pub mod minimarket;
pub mod prompt;
pub mod todos;
