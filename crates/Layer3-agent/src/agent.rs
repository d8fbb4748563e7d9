//! Agent variants and execution
//!
//! One concrete [`Agent`] type covers every variant; the differences
//! between variants (temperature, tool access, prompt framing) live in
//! [`AgentType::profile`]. Adding a variant means adding an enum arm,
//! not a new type.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error};

use moon_foundation::{Error, Message, ToolContext, ToolResult};
use moon_provider::{ChatRequest, ModelService};
use moon_tool::ToolRegistry;

use crate::conversation::{ConversationLoop, DEFAULT_MAX_ROUNDS};

// ============================================================================
// Agent types
// ============================================================================

/// Which kind of agent to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    /// Research, code search, and multi-step tasks with tools
    GeneralPurpose,
    /// Planning and analysis, single completion, no tools
    Plan,
    /// Codebase exploration and analysis with tools
    Explore,
}

/// Behavioral profile of an agent variant
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    /// Sampling temperature
    pub temperature: f32,

    /// Whether the agent gets tools and a multi-round loop
    pub uses_tools: bool,

    /// Role framing appended after the base system prompt
    pub preamble: &'static str,
}

const GENERAL_PURPOSE_PREAMBLE: &str = "\
You have access to the following tools:
- run_shell_command: Execute shell commands
- file_tool: Read, write, and search files
- search_tool: Search for patterns in files

Please analyze the request and decide whether to use tools. If you need \
to use tools, call them directly. If you can answer from your knowledge, \
provide a direct response.";

const PLAN_PREAMBLE: &str = "\
Your role is to:
1. Analyze the request thoroughly
2. Break down complex tasks into manageable steps
3. Provide a clear, actionable plan
4. Identify potential challenges and solutions
5. Suggest the best approach and tools to use

Please provide a detailed plan with numbered steps.";

const EXPLORE_PREAMBLE: &str = "\
Your role is to:
1. Explore and understand the codebase structure
2. Analyze code patterns, architecture, and conventions
3. Identify key components and their relationships
4. Document findings and insights
5. Provide recommendations for improvements

Use appropriate tools to explore files, search for patterns, and analyze \
the codebase.";

impl AgentType {
    /// All supported agent types
    pub const ALL: [AgentType; 3] = [AgentType::GeneralPurpose, AgentType::Plan, AgentType::Explore];

    /// Stable identifier used in requests and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::GeneralPurpose => "general-purpose",
            AgentType::Plan => "plan-agent",
            AgentType::Explore => "explore-agent",
        }
    }

    /// Human-readable agent name used in result metadata
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::GeneralPurpose => "GeneralPurposeAgent",
            AgentType::Plan => "PlanAgent",
            AgentType::Explore => "ExploreAgent",
        }
    }

    /// Behavioral profile for this variant
    pub fn profile(&self) -> AgentProfile {
        match self {
            AgentType::GeneralPurpose => AgentProfile {
                temperature: 0.6,
                uses_tools: true,
                preamble: GENERAL_PURPOSE_PREAMBLE,
            },
            AgentType::Plan => AgentProfile {
                temperature: 0.3,
                uses_tools: false,
                preamble: PLAN_PREAMBLE,
            },
            AgentType::Explore => AgentProfile {
                temperature: 0.5,
                uses_tools: true,
                preamble: EXPLORE_PREAMBLE,
            },
        }
    }
}

impl FromStr for AgentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general-purpose" => Ok(AgentType::GeneralPurpose),
            "plan-agent" => Ok(AgentType::Plan),
            "explore-agent" => Ok(AgentType::Explore),
            other => Err(Error::UnknownAgentType(other.to_string())),
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Agent spec
// ============================================================================

/// What an agent has been asked to do
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Short task description
    pub description: String,

    /// Optional constraints on the work
    pub constraints: Option<String>,

    /// Optional output format requirements
    pub output_format: Option<String>,
}

impl AgentSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            constraints: None,
            output_format: None,
        }
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    pub fn with_output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = Some(output_format.into());
        self
    }

    /// Build the full system prompt for a variant
    pub fn system_prompt(&self, agent_type: AgentType) -> String {
        let mut prompt = format!(
            "You are a {} agent.\n\nTask: {}\n",
            agent_type.display_name(),
            self.description
        );

        if let Some(ref constraints) = self.constraints {
            prompt.push_str(&format!("\nConstraints:\n{}\n", constraints));
        }

        if let Some(ref output_format) = self.output_format {
            prompt.push_str(&format!("\nOutput Format:\n{}\n", output_format));
        }

        prompt.push('\n');
        prompt.push_str(agent_type.profile().preamble);
        prompt
    }
}

// ============================================================================
// Agent
// ============================================================================

/// A runnable agent
pub struct Agent {
    agent_type: AgentType,
    spec: AgentSpec,
    service: Arc<dyn ModelService>,
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
    max_rounds: usize,
}

impl Agent {
    pub fn new(
        agent_type: AgentType,
        spec: AgentSpec,
        service: Arc<dyn ModelService>,
        registry: Arc<ToolRegistry>,
        ctx: ToolContext,
    ) -> Self {
        Self {
            agent_type,
            spec,
            service,
            registry,
            ctx,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Override the round budget for tool-using variants
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    pub fn description(&self) -> &str {
        &self.spec.description
    }

    /// Run the agent.
    ///
    /// Never returns `Err`; model-service failures come back as a failed
    /// `ToolResult` so task workers and callers see one uniform shape.
    pub async fn execute(&self, prompt: &str) -> ToolResult {
        debug!(agent = %self.agent_type, "agent starting");

        let result = if self.agent_type.profile().uses_tools {
            self.execute_with_tools(prompt).await
        } else {
            self.execute_plan(prompt).await
        };

        if !result.success {
            error!(agent = %self.agent_type, error = ?result.error, "agent failed");
        }

        result
    }

    /// Tool-using variants: run the full conversation loop.
    async fn execute_with_tools(&self, prompt: &str) -> ToolResult {
        let profile = self.agent_type.profile();
        let system_prompt = self.spec.system_prompt(self.agent_type);

        let conversation = ConversationLoop::new(
            Arc::clone(&self.service),
            Arc::clone(&self.registry),
            self.ctx.clone(),
            profile.temperature,
        )
        .with_max_rounds(self.max_rounds);

        let outcome = match conversation.run(&system_prompt, prompt).await {
            Ok(outcome) => outcome,
            Err(e) => {
                return ToolResult::err(format!(
                    "{} execution failed: {}",
                    self.agent_type.display_name(),
                    e
                ));
            }
        };

        let mut result = ToolResult::ok(json!({
            "agent_type": self.agent_type.as_str(),
            "description": self.spec.description,
            "llm_result": outcome.to_json(),
            "prompt": prompt,
        }))
        .with_metadata("agent", json!(self.agent_type.display_name()))
        .with_metadata("model", json!(self.service.model()))
        .with_metadata("execution_type", json!(outcome.execution_kind()))
        .with_metadata("total_tool_calls", json!(outcome.tool_call_count()));

        if self.agent_type == AgentType::Explore {
            result = result.with_metadata("exploration_type", json!("codebase_analysis"));
        }

        result
    }

    /// Plan variant: one completion, no tools.
    async fn execute_plan(&self, prompt: &str) -> ToolResult {
        let profile = self.agent_type.profile();
        let system_prompt = self.spec.system_prompt(self.agent_type);

        let request = ChatRequest::new(
            vec![Message::system(system_prompt), Message::user(prompt)],
            profile.temperature,
        );

        let response = match self.service.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                return ToolResult::err(format!(
                    "{} execution failed: {}",
                    self.agent_type.display_name(),
                    e
                ));
            }
        };

        ToolResult::ok(json!({
            "agent_type": self.agent_type.as_str(),
            "description": self.spec.description,
            "plan": response.content,
            "prompt": prompt,
        }))
        .with_metadata("agent", json!(self.agent_type.display_name()))
        .with_metadata("model", json!(self.service.model()))
        .with_metadata("output_type", json!("plan"))
    }
}
