//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
///
/// Wire names match the upstream chat-completion protocol
/// (`"user"`, `"assistant"`, `"system"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message (persona prompt).
    System,
}

impl MessageRole {
    /// The upstream wire name for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A single message in a conversation history.
///
/// Messages are immutable once appended; append order is the
/// conversation's causal order and is never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the message was created.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message with a fresh id and the current timestamp.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_messages_get_unique_ids() {
        let a = ChatMessage::user("hello");
        let b = ChatMessage::user("hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, MessageRole::User);
        assert_eq!(a.content, "hello");
    }

    #[test]
    fn role_serializes_to_wire_name() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(MessageRole::System.as_str(), "system");
    }
}
