use serde::{Deserialize, Serialize};

use super::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One turn in the transcript.
///
/// `tool_calls` is only ever populated on assistant messages, and
/// `tool_call_id` only on tool messages, where it names the assistant
/// tool call the message answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool message answering the tool call with the given id
    pub fn tool<I, S>(tool_call_id: I, content: S) -> Self
    where
        I: Into<String>,
        S: Into<String>,
    {
        let mut message = Self::new(Role::Tool, content);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    /// Attach tool calls to the message
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders_set_roles() {
        assert_eq!(Message::system("a").role, Role::System);
        assert_eq!(Message::user("b").role, Role::User);
        assert_eq!(Message::assistant("c").role, Role::Assistant);
        assert_eq!(Message::tool("call_0", "d").role, Role::Tool);
    }

    #[test]
    fn test_tool_message_carries_id() {
        let message = Message::tool("call_3", "42");
        assert_eq!(message.tool_call_id.as_deref(), Some("call_3"));
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn test_serialization_skips_empty_tool_fields() {
        let plain = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(plain, json!({"role": "user", "content": "hi"}));

        let with_calls = Message::assistant("").with_tool_calls(vec![ToolCall::new(
            "call_0",
            "time_get_current_time",
            json!({"timezone": "Europe/London"}),
        )]);
        let value = serde_json::to_value(with_calls).unwrap();
        assert_eq!(value["tool_calls"][0]["name"], "time_get_current_time");
    }
}
