//! Model service abstraction
//!
//! One trait, one request shape, one response shape. Providers implement
//! [`ModelService`]; everything above this crate talks to the trait only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use moon_foundation::{Message, ToolCall, ToolSchema};

use crate::error::ProviderError;

/// How the model may use the advertised tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Model decides whether to call tools
    Auto,
    /// Tools are not offered for this request
    None,
}

/// A single chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Full conversation so far, in order
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Tools the model may call
    pub tools: Vec<ToolSchema>,

    /// Tool usage policy
    pub tool_choice: ToolChoice,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
        }
    }

    /// Offer tools with automatic tool choice
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tool_choice = if tools.is_empty() {
            ToolChoice::None
        } else {
            ToolChoice::Auto
        };
        self.tools = tools;
        self
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    ToolUse,
    ContentFilter,
    Other,
}

/// Token accounting for a single completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A single chat completion response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Assistant text (may be empty when only tool calls are present)
    pub content: String,

    /// Tool calls in the order the model emitted them
    pub tool_calls: Vec<ToolCall>,

    /// Token usage reported by the API
    pub usage: TokenUsage,

    /// Why generation stopped
    pub finish_reason: FinishReason,

    /// Model that produced the response
    pub model: String,
}

impl ChatResponse {
    /// Whether the model requested any tool executions
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A chat completion backend
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Model identifier requests are issued against
    fn model(&self) -> &str;

    /// Issue one completion request
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tools_means_no_tool_choice() {
        let req = ChatRequest::new(vec![Message::user("hi")], 0.6).with_tools(vec![]);
        assert_eq!(req.tool_choice, ToolChoice::None);
    }

    #[test]
    fn with_tools_switches_to_auto() {
        let tools = vec![ToolSchema::new("run_shell_command", "Run a shell command")];
        let req = ChatRequest::new(vec![Message::user("hi")], 0.6).with_tools(tools);
        assert_eq!(req.tool_choice, ToolChoice::Auto);
        assert_eq!(req.tools.len(), 1);
    }
}
