//! # moon-foundation
//!
//! Foundation layer for MoonAgent:
//! - Core: shared types and traits (Message, ToolCall, Tool, ToolResult)
//! - Error: central error type and Result alias
//! - Config: environment-first runtime settings
//!
//! Everything above this layer (provider, tools, agents, CLI) depends on
//! these definitions; nothing here depends back up.

pub mod config;
pub mod core;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core types
// ============================================================================
pub use core::{
    Message, MessageRole, Tool, ToolCall, ToolContext, ToolParameters, ToolResult,
    ToolResultMessage, ToolSchema,
};

// ============================================================================
// Config
// ============================================================================
pub use config::{Settings, SettingsOverrides, DEFAULT_BASE_URL, DEFAULT_MODEL};
