//! # moon-tool
//!
//! Tool system for MoonAgent:
//! - `ToolRegistry`: registration, lookup, and never-failing dispatch
//! - Builtin tools: shell execution, file operations, regex search

pub mod builtin;
pub mod registry;

pub use builtin::{all_tools, FileTool, SearchTool, ShellTool};
pub use registry::ToolRegistry;
