//! Message and Conversation domain types.
//!
//! These are the value objects replayed to the backend on every turn:
//! operator types a line → loop appends a user message → provider streams an
//! assistant message → tool results are folded into a tool message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConversationError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The operator (or a compaction summary standing in for them)
    User,
    /// The model
    Assistant,
    /// Folded tool execution results
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// For tool messages, the call the results answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: Option<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = tool_call_id;
        msg
    }

    /// Whether this is an assistant message that requested at least one tool.
    pub fn has_tool_calls(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Backend-assigned ID for this tool call (may be empty)
    #[serde(default)]
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a raw JSON string, decoded only by the dispatcher
    pub arguments: String,
}

impl MessageToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// The transcript of one session: an ordered, append-only list of messages.
///
/// Order is the literal order replayed to the backend. The only non-append
/// mutation is [`Conversation::replace_with_summary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID (used in logs)
    pub id: String,

    messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message.
    ///
    /// A tool message is only accepted directly after an assistant message
    /// that requested at least one tool call.
    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        if message.role == Role::Tool
            && !self.messages.last().is_some_and(Message::has_tool_calls)
        {
            return Err(ConversationError::OrphanToolMessage);
        }
        self.updated_at = Utc::now();
        self.messages.push(message);
        Ok(())
    }

    /// Drop the whole history in favour of a single summary message.
    pub fn replace_with_summary(&mut self, summary: Message) {
        self.updated_at = Utc::now();
        self.messages = vec![summary];
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Render the transcript as pretty JSON for diagnostics.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(&self.messages)
            .unwrap_or_else(|e| format!("<transcript not serializable: {e}>"))
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.content.len() / 4).sum()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant_with_call() -> Message {
        let mut msg = Message::assistant("");
        msg.tool_calls
            .push(MessageToolCall::new("listFiles", r#"{"dirPath":"."}"#));
        msg
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Message::user("First message")).unwrap();
        assert_eq!(conv.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn tool_message_needs_preceding_tool_call() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi")).unwrap();
        let err = conv.push(Message::tool_result(None, "[]")).unwrap_err();
        assert!(matches!(err, ConversationError::OrphanToolMessage));

        conv.push(Message::assistant("plain answer")).unwrap();
        assert!(conv.push(Message::tool_result(None, "[]")).is_err());

        conv.push(assistant_with_call()).unwrap();
        conv.push(Message::tool_result(None, "[]")).unwrap();
        assert_eq!(conv.len(), 4);
    }

    #[test]
    fn summary_replaces_history() {
        let mut conv = Conversation::new();
        for i in 0..12 {
            conv.push(Message::user(format!("message {i}"))).unwrap();
        }
        conv.replace_with_summary(Message::user("summary"));
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].content, "summary");
    }

    #[test]
    fn dump_contains_every_message() {
        let mut conv = Conversation::new();
        conv.push(Message::user("list the files")).unwrap();
        conv.push(assistant_with_call()).unwrap();
        let dump = conv.dump();
        assert!(dump.contains("list the files"));
        assert!(dump.contains("listFiles"));
        assert!(dump.contains(r#""role": "assistant""#));
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::User);
    }

    #[test]
    fn conversation_token_estimate() {
        let mut conv = Conversation::new();
        // 20 chars ≈ 5 tokens
        conv.push(Message::user("12345678901234567890")).unwrap();
        assert_eq!(conv.estimated_tokens(), 5);
    }
}
