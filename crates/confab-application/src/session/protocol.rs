//! Request protocol of the session actor.
//!
//! Transport-agnostic: the surrounding routing layer maps these types to
//! whatever wire format it serves.

use confab_core::session::ChatState;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// One chat request against a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Model override adopted by the session before processing.
    #[serde(default)]
    pub model: Option<String>,
    /// Whether the reply should be streamed back incrementally.
    #[serde(default)]
    pub stream: bool,
    /// Persona system prompt conditioning this turn.
    #[serde(default)]
    pub persona: Option<String>,
    /// Caller-supplied credential; its absence marks shared-credential
    /// usage and triggers the throttling policy on streamed turns.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn streamed(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Successful outcome of a chat request.
#[derive(Debug)]
pub enum ChatReply {
    /// Live delta stream; it ends once the turn has been finalized.
    Stream(mpsc::Receiver<String>),
    /// Full state after a non-streamed turn completed.
    State(ChatState),
}

/// Rejections and failures surfaced at the actor boundary.
///
/// Upstream failures on a streamed turn are absorbed into the
/// conversation as an assistant-role error message and never appear
/// here; `ProcessingFailed` covers only failures that happen before any
/// streaming has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The message text trimmed to empty.
    #[error("message is required")]
    EmptyMessage,
    /// The model id was missing or empty.
    #[error("model is required")]
    MissingModel,
    /// A chat turn is already in flight for this session.
    #[error("a chat turn is already being processed for this session")]
    Busy,
    /// A non-streamed turn failed before producing a reply.
    #[error("failed to process chat message")]
    ProcessingFailed,
    /// The session actor is no longer running.
    #[error("session is no longer available")]
    SessionClosed,
}
