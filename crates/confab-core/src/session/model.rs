//! Per-session chat state.
//!
//! This is the state a session actor exclusively owns for the lifetime of
//! its session id. It is independent from the registry's `SessionInfo`:
//! the actor knows nothing about titles or activity bookkeeping, and the
//! registry knows nothing about message history.

use super::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// Snapshot of one conversation's state.
///
/// Invariants:
/// - `is_processing` is true from the moment a chat request is accepted
///   until the final assistant (or error) message has been appended.
/// - `streaming_buffer` mirrors the content of the in-progress assistant
///   message and is `Some` only while a streamed turn is processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    /// Opaque session identifier.
    pub session_id: String,
    /// Conversation history in append order.
    pub messages: Vec<ChatMessage>,
    /// Whether a chat turn is currently in flight.
    pub is_processing: bool,
    /// Model id used for upstream completion calls.
    pub model: String,
    /// Reference to a persona, stored by value and never validated here.
    pub persona_id: Option<String>,
    /// Accumulated content of the assistant message being streamed.
    pub streaming_buffer: Option<String>,
}

impl ChatState {
    /// Creates the initial state for a new session.
    pub fn new(session_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            is_processing: false,
            model: model.into(),
            persona_id: None,
            streaming_buffer: None,
        }
    }
}
