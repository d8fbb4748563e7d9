//! Background task types and the task manager

mod manager;
mod tool;

pub use manager::{TaskManager, TaskManagerConfig, DEFAULT_MAX_CONCURRENT};
pub use tool::TaskTool;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use moon_foundation::ToolResult;

use crate::agent::AgentType;

/// Unique task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form for display
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a background task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Queued, waiting for a worker slot
    Pending,
    /// Executing on a worker
    Running,
    /// Finished; the agent produced a result (success or failure)
    Completed,
    /// The worker itself died before producing a result
    Failed,
}

impl TaskState {
    /// Whether this state will never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a task
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    /// Task identifier
    pub id: TaskId,

    /// Agent variant running the task
    pub agent_type: AgentType,

    /// What the task was asked to do
    pub description: String,

    /// Current lifecycle state
    pub state: TaskState,

    /// Agent result, present once completed
    pub result: Option<ToolResult>,

    /// Worker failure description, present once failed
    pub error: Option<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
        assert_eq!(TaskId::new().short().len(), 8);
    }
}
