//! Conversation transcript management

use moon_foundation::{Message, MessageRole, ToolCall};

/// Append-only transcript of a single conversation
///
/// Messages are never reordered or removed once added; the model always
/// sees the full history in the order it happened.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Messages in order
    messages: Vec<Message>,

    /// System prompt, prepended on render
    system_prompt: Option<String>,
}

impl Transcript {
    /// Create a new empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a system prompt
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![],
            system_prompt: Some(prompt.into()),
        }
    }

    /// Get system prompt
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Add an assistant message carrying exactly one tool call
    pub fn add_assistant_tool_call(&mut self, content: impl Into<String>, call: ToolCall) {
        self.messages
            .push(Message::assistant_with_tools(content, vec![call]));
    }

    /// Add a tool result answering a specific call
    pub fn add_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) {
        self.messages
            .push(Message::tool_result(tool_call_id, content, is_error));
    }

    /// Get all messages (without the system prompt)
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Render the full message list for a completion request, system
    /// prompt first.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            out.push(Message::system(prompt.clone()));
        }
        out.extend(self.messages.iter().cloned());
        out
    }

    /// Get message count (excluding the system prompt)
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get the last assistant message
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_prompt_renders_first() {
        let mut transcript = Transcript::with_system_prompt("You are helpful.");
        transcript.add_user("hello");

        let rendered = transcript.to_messages();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].role, MessageRole::System);
        assert_eq!(rendered[1].role, MessageRole::User);
        // len() counts only conversation messages
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn tool_call_and_result_append_in_pairs() {
        let mut transcript = Transcript::new();
        transcript.add_user("list files");

        let call = ToolCall::new("call_1", "run_shell_command", json!({"command": "ls"}));
        transcript.add_assistant_tool_call("", call);
        transcript.add_tool_result("call_1", "{\"success\":true}", false);

        assert_eq!(transcript.len(), 3);
        let msgs = transcript.messages();
        assert_eq!(msgs[1].tool_calls.as_ref().map(Vec::len), Some(1));
        let result = msgs[2].tool_result.as_ref().unwrap();
        assert_eq!(result.tool_call_id, "call_1");
    }

    #[test]
    fn last_assistant_skips_tool_messages() {
        let mut transcript = Transcript::new();
        transcript.add_user("hi");
        transcript.add_assistant("answer");
        transcript.add_tool_result("call_1", "{}", false);

        let last = transcript.last_assistant().unwrap();
        assert_eq!(last.content, "answer");
    }
}
