//! MoonAgent agent layer
//!
//! Agents, the tool-calling conversation loop, and the background task
//! manager that runs agents concurrently.

pub mod agent;
pub mod conversation;
pub mod task;
pub mod transcript;

// ============================================================================
// Re-exports
// ============================================================================

pub use agent::{Agent, AgentProfile, AgentSpec, AgentType};
pub use conversation::{ConversationLoop, LoopOutcome, DEFAULT_MAX_ROUNDS};
pub use task::{TaskId, TaskManager, TaskManagerConfig, TaskSnapshot, TaskState, TaskTool};
pub use transcript::Transcript;
