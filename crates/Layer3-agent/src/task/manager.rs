//! Concurrent task manager
//!
//! Runs agents as background tasks on a bounded worker pool. Tasks move
//! through pending -> running -> completed; `failed` exists only for the
//! case where a worker dies without producing a result. Waiting on a task
//! observes it and never cancels it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::{watch, Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use moon_foundation::{Error, Result, ToolContext};
use moon_provider::ModelService;
use moon_tool::ToolRegistry;

use crate::agent::{Agent, AgentSpec, AgentType};
use crate::task::{TaskId, TaskSnapshot, TaskState};

/// Default worker pool width
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Task manager configuration
#[derive(Debug, Clone)]
pub struct TaskManagerConfig {
    /// Maximum number of tasks executing at once
    pub max_concurrent: usize,

    /// Round budget handed to tool-using agents
    pub max_rounds: usize,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_rounds: crate::conversation::DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Registry entry for one task
struct TaskEntry {
    snapshot: TaskSnapshot,
    state_rx: watch::Receiver<TaskState>,
}

/// Concurrent background task manager
pub struct TaskManager {
    tasks: Arc<RwLock<HashMap<TaskId, TaskEntry>>>,
    semaphore: Arc<Semaphore>,
    accepting: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
    service: Arc<dyn ModelService>,
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
    config: TaskManagerConfig,
}

impl TaskManager {
    pub fn new(
        service: Arc<dyn ModelService>,
        registry: Arc<ToolRegistry>,
        ctx: ToolContext,
        config: TaskManagerConfig,
    ) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            accepting: AtomicBool::new(true),
            handles: Mutex::new(Vec::new()),
            service,
            registry,
            ctx,
            config,
        }
    }

    /// Create a background task and return its id immediately.
    ///
    /// An unknown agent type fails here, synchronously, and registers
    /// nothing. Execution starts as soon as a worker slot frees up.
    pub async fn create(
        &self,
        agent_type: &str,
        description: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<TaskId> {
        self.create_with_spec(agent_type, AgentSpec::new(description), prompt)
            .await
    }

    /// Create a background task with full agent spec control.
    pub async fn create_with_spec(
        &self,
        agent_type: &str,
        spec: AgentSpec,
        prompt: impl Into<String>,
    ) -> Result<TaskId> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        // Validate before anything is registered
        let agent_type: AgentType = agent_type.parse()?;
        let prompt = prompt.into();

        let id = TaskId::new();
        let (state_tx, state_rx) = watch::channel(TaskState::Pending);

        {
            let mut tasks = self.tasks.write().await;
            tasks.insert(
                id,
                TaskEntry {
                    snapshot: TaskSnapshot {
                        id,
                        agent_type,
                        description: spec.description.clone(),
                        state: TaskState::Pending,
                        result: None,
                        error: None,
                        created_at: chrono::Utc::now(),
                    },
                    state_rx,
                },
            );
        }

        info!(task_id = %id.short(), agent = %agent_type, "task created");

        let agent = Agent::new(
            agent_type,
            spec,
            Arc::clone(&self.service),
            Arc::clone(&self.registry),
            self.ctx.clone(),
        )
        .with_max_rounds(self.config.max_rounds);

        let tasks = Arc::clone(&self.tasks);
        let semaphore = Arc::clone(&self.semaphore);

        let handle = tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // Pool closed underneath us; record the failure
                    Self::transition(&tasks, id, &state_tx, TaskState::Failed, |snap| {
                        snap.error = Some("worker pool closed".to_string());
                    })
                    .await;
                    return;
                }
            };

            Self::transition(&tasks, id, &state_tx, TaskState::Running, |_| {}).await;
            debug!(task_id = %id.short(), "task running");

            let outcome = AssertUnwindSafe(agent.execute(&prompt)).catch_unwind().await;
            drop(permit);

            match outcome {
                Ok(result) => {
                    Self::transition(&tasks, id, &state_tx, TaskState::Completed, |snap| {
                        snap.result = Some(result);
                    })
                    .await;
                    debug!(task_id = %id.short(), "task completed");
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<String>()
                        .cloned()
                        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                        .unwrap_or_else(|| "worker panicked".to_string());

                    error!(task_id = %id.short(), %message, "task worker panicked");
                    Self::transition(&tasks, id, &state_tx, TaskState::Failed, |snap| {
                        snap.error = Some(message);
                    })
                    .await;
                }
            }
        });

        self.handles.lock().await.push(handle);
        Ok(id)
    }

    /// Apply a state transition. The registry snapshot is updated before
    /// the state change is broadcast, so a waiter that wakes on the
    /// terminal state always reads the finished snapshot.
    async fn transition(
        tasks: &RwLock<HashMap<TaskId, TaskEntry>>,
        id: TaskId,
        state_tx: &watch::Sender<TaskState>,
        state: TaskState,
        update: impl FnOnce(&mut TaskSnapshot),
    ) {
        {
            let mut tasks = tasks.write().await;
            if let Some(entry) = tasks.get_mut(&id) {
                entry.snapshot.state = state;
                update(&mut entry.snapshot);
            }
        }
        let _ = state_tx.send(state);
    }

    /// Current snapshot of one task
    pub async fn status(&self, id: TaskId) -> Option<TaskSnapshot> {
        self.tasks
            .read()
            .await
            .get(&id)
            .map(|entry| entry.snapshot.clone())
    }

    /// Current snapshots of every known task
    pub async fn all(&self) -> Vec<TaskSnapshot> {
        self.tasks
            .read()
            .await
            .values()
            .map(|entry| entry.snapshot.clone())
            .collect()
    }

    /// Number of known tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no tasks have been created
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Wait for a task to reach a terminal state.
    ///
    /// A timeout returns the current snapshot, which may still be pending
    /// or running; the task keeps executing either way.
    pub async fn wait(&self, id: TaskId, timeout: Option<Duration>) -> Result<TaskSnapshot> {
        let mut state_rx = {
            let tasks = self.tasks.read().await;
            let entry = tasks
                .get(&id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            entry.state_rx.clone()
        };

        let wait = state_rx.wait_for(|state| state.is_terminal());

        match timeout {
            Some(timeout) => {
                // Elapsed or sender-dropped both fall through to the
                // current snapshot; the task is never cancelled here.
                let _ = tokio::time::timeout(timeout, wait).await;
            }
            None => {
                let _ = wait.await;
            }
        }

        self.status(id)
            .await
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Wait for every known task, sharing one deadline across them all.
    pub async fn wait_all(&self, timeout: Option<Duration>) -> Result<Vec<TaskSnapshot>> {
        let ids: Vec<TaskId> = {
            let tasks = self.tasks.read().await;
            tasks.keys().copied().collect()
        };

        let deadline = timeout.map(|t| Instant::now() + t);
        let mut snapshots = Vec::with_capacity(ids.len());

        for id in ids {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            snapshots.push(self.wait(id, remaining).await?);
        }

        Ok(snapshots)
    }

    /// Stop accepting new tasks and drain the workers.
    ///
    /// In-flight tasks run to completion; nothing is aborted.
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        info!("task manager shutting down");

        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }

        info!("task manager drained");
    }
}
