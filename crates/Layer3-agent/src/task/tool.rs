//! Task tool: launch subagents from inside a conversation

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use moon_foundation::{Result, Tool, ToolContext, ToolResult, ToolSchema};

use crate::agent::{AgentSpec, AgentType};
use crate::task::TaskManager;

/// Input for the task tool
#[derive(Debug, Deserialize)]
struct TaskInput {
    subagent_type: String,
    description: String,
    prompt: String,
    #[serde(default)]
    constraints: Option<String>,
    #[serde(default)]
    output_format: Option<String>,
}

/// Tool that launches a new agent as a background task
pub struct TaskTool {
    manager: Arc<TaskManager>,
}

impl TaskTool {
    pub const NAME: &'static str = "task";

    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }

    /// The manager behind this tool, for status queries and waits
    pub fn manager(&self) -> &Arc<TaskManager> {
        &self.manager
    }
}

#[async_trait]
impl Tool for TaskTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            Self::NAME,
            "Launch a new agent to handle complex, multi-step tasks autonomously",
        )
        .with_enum_param(
            "subagent_type",
            "The type of specialized agent to launch",
            AgentType::ALL.iter().map(|t| t.as_str()).collect(),
            true,
        )
        .with_string_param("description", "A short (3-5 word) description of the task", true)
        .with_string_param(
            "prompt",
            "The detailed task description for the agent to perform",
            true,
        )
        .with_string_param(
            "constraints",
            "Optional constraints or limitations for task execution",
            false,
        )
        .with_string_param(
            "output_format",
            "Optional output format template for the task result",
            false,
        )
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<ToolResult> {
        let input: TaskInput = serde_json::from_value(args)?;

        if input.subagent_type.parse::<AgentType>().is_err() {
            let valid = AgentType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Ok(ToolResult::err(format!(
                "Invalid subagent_type. Must be one of: {}",
                valid
            )));
        }

        let mut spec = AgentSpec::new(&input.description);
        if let Some(constraints) = input.constraints {
            spec = spec.with_constraints(constraints);
        }
        if let Some(output_format) = input.output_format {
            spec = spec.with_output_format(output_format);
        }

        let id = match self
            .manager
            .create_with_spec(&input.subagent_type, spec, input.prompt)
            .await
        {
            Ok(id) => id,
            Err(e) => return Ok(ToolResult::err(format!("Failed to create task: {}", e))),
        };

        let snapshot = self.manager.status(id).await;
        let status = snapshot
            .as_ref()
            .map(|snap| snap.state.to_string())
            .unwrap_or_else(|| "pending".to_string());
        let created_at = snapshot
            .as_ref()
            .map(|snap| snap.created_at.to_rfc3339())
            .unwrap_or_default();

        Ok(ToolResult::ok(json!({
            "task_id": id.to_string(),
            "status": status,
            "agent_type": input.subagent_type,
            "description": input.description,
        }))
        .with_metadata("task_id", json!(id.to_string()))
        .with_metadata("created_at", json!(created_at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskManagerConfig;
    use async_trait::async_trait;
    use moon_provider::{ChatRequest, ChatResponse, FinishReason, ModelService, ProviderError, TokenUsage};
    use moon_tool::ToolRegistry;

    struct EchoService;

    #[async_trait]
    impl ModelService for EchoService {
        fn model(&self) -> &str {
            "mock-model"
        }

        async fn complete(
            &self,
            _request: ChatRequest,
        ) -> std::result::Result<ChatResponse, ProviderError> {
            Ok(ChatResponse {
                content: "ok".to_string(),
                tool_calls: vec![],
                usage: TokenUsage::default(),
                finish_reason: FinishReason::Stop,
                model: "mock-model".to_string(),
            })
        }
    }

    fn task_tool() -> TaskTool {
        TaskTool::new(Arc::new(TaskManager::new(
            Arc::new(EchoService),
            Arc::new(ToolRegistry::new()),
            ToolContext::default(),
            TaskManagerConfig::default(),
        )))
    }

    #[tokio::test]
    async fn launches_a_task() {
        let tool = task_tool();
        let result = tool
            .execute(
                json!({
                    "subagent_type": "plan-agent",
                    "description": "plan the work",
                    "prompt": "make a plan"
                }),
                &ToolContext::default(),
            )
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["agent_type"], "plan-agent");
        // The worker may already have picked the task up, so either
        // pre-terminal state is acceptable here.
        let status = data["status"].as_str().unwrap();
        assert!(
            status == "pending" || status == "running",
            "unexpected launch status: {status}"
        );
        assert!(!data["task_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_subagent_type() {
        let tool = task_tool();
        let result = tool
            .execute(
                json!({
                    "subagent_type": "builder-agent",
                    "description": "desc",
                    "prompt": "prompt"
                }),
                &ToolContext::default(),
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid subagent_type"));
        assert!(tool.manager().is_empty().await);
    }

    #[tokio::test]
    async fn schema_enumerates_agent_types() {
        let schema = task_tool().schema();
        assert_eq!(schema.name, "task");
        assert_eq!(
            schema.parameters.required,
            vec!["subagent_type", "description", "prompt"]
        );
        let props = schema.parameters.properties.as_object().unwrap();
        let values = props["subagent_type"]["enum"].as_array().unwrap();
        assert_eq!(values.len(), 3);
    }
}
