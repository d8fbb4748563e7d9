//! Multi-round tool-calling conversation loop
//!
//! Drives a bounded loop against a [`ModelService`]: each round asks the
//! model for a completion with the registry's tools on offer, executes
//! every requested tool call in order, and feeds the results back. The
//! loop ends when the model answers without tool calls or the round
//! budget runs out.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use moon_foundation::{Result, ToolCall, ToolContext, ToolResult};
use moon_provider::{ChatRequest, ModelService};
use moon_tool::ToolRegistry;

use crate::transcript::Transcript;

/// Default round budget for a tool-calling conversation
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Final text used when the round budget is exhausted
const BUDGET_EXHAUSTED_TEXT: &str = "Maximum iterations reached";

/// Outcome of a completed conversation loop
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Final assistant text
    pub final_text: String,

    /// Every tool result produced, in execution order
    pub tool_results: Vec<ToolResult>,

    /// Every tool call the model made, in execution order
    pub tool_calls: Vec<ToolCall>,

    /// Number of tool rounds that ran before termination
    pub rounds_used: usize,

    /// Whether the loop stopped because the round budget ran out
    pub budget_exhausted: bool,
}

impl LoopOutcome {
    /// Total number of tool calls executed
    pub fn tool_call_count(&self) -> usize {
        self.tool_calls.len()
    }

    /// How the conversation ended, as a short label
    pub fn execution_kind(&self) -> &'static str {
        if self.budget_exhausted {
            "multi_turn_max_iter"
        } else if self.tool_calls.is_empty() {
            "direct_response"
        } else {
            "multi_turn"
        }
    }

    /// Structured summary of the run
    pub fn to_json(&self) -> Value {
        json!({
            "llm_response": self.final_text,
            "tool_results": self.tool_results,
            "tool_calls": self.tool_calls,
            "iterations": self.rounds_used,
        })
    }
}

/// The conversation loop driver
pub struct ConversationLoop {
    service: Arc<dyn ModelService>,
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
    max_rounds: usize,
    temperature: f32,
}

impl ConversationLoop {
    pub fn new(
        service: Arc<dyn ModelService>,
        registry: Arc<ToolRegistry>,
        ctx: ToolContext,
        temperature: f32,
    ) -> Self {
        Self {
            service,
            registry,
            ctx,
            max_rounds: DEFAULT_MAX_ROUNDS,
            temperature,
        }
    }

    /// Override the round budget
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Run the loop to completion.
    ///
    /// A transport or provider failure aborts the whole run; partial
    /// progress is not returned. Tool failures do not abort anything,
    /// they go back to the model as error results.
    pub async fn run(&self, system_prompt: &str, user_prompt: &str) -> Result<LoopOutcome> {
        let mut transcript = Transcript::with_system_prompt(system_prompt);
        transcript.add_user(user_prompt);

        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut tool_results: Vec<ToolResult> = Vec::new();

        for round in 0..self.max_rounds {
            let request = ChatRequest::new(transcript.to_messages(), self.temperature)
                .with_tools(self.registry.schemas());

            let response = self.service.complete(request).await?;

            if !response.has_tool_calls() {
                debug!(round, tool_calls = tool_calls.len(), "conversation finished");
                return Ok(LoopOutcome {
                    final_text: response.content,
                    tool_results,
                    tool_calls,
                    rounds_used: round,
                    budget_exhausted: false,
                });
            }

            // Execute calls one at a time, in the order the model emitted
            // them. Each call appends its own assistant message and result
            // message so the transcript pairs up call-for-call.
            for call in response.tool_calls {
                debug!(round, tool = %call.name, "executing tool call");

                transcript.add_assistant_tool_call(response.content.clone(), call.clone());

                let result = self
                    .registry
                    .dispatch(&call.name, call.arguments.clone(), &self.ctx)
                    .await;

                transcript.add_tool_result(&call.id, result.to_message_content(), !result.success);

                tool_calls.push(call);
                tool_results.push(result);
            }
        }

        warn!(
            max_rounds = self.max_rounds,
            tool_calls = tool_calls.len(),
            "round budget exhausted"
        );

        Ok(LoopOutcome {
            final_text: BUDGET_EXHAUSTED_TEXT.to_string(),
            tool_results,
            tool_calls,
            rounds_used: self.max_rounds,
            budget_exhausted: true,
        })
    }
}
