//! Core types shared across the workspace

pub mod message;
pub mod tool;

pub use message::{Message, MessageRole, ToolCall, ToolResultMessage};
pub use tool::{Tool, ToolContext, ToolParameters, ToolResult, ToolSchema};
