//! Cloneable handle to one session actor.

use super::actor::Command;
use super::protocol::{ChatReply, ChatRequest, RequestError};
use confab_core::session::ChatState;
use tokio::sync::{mpsc, oneshot};

/// The request surface of a session actor.
///
/// All methods serialize through the actor's command channel; a closed
/// channel (evicted or stopped actor) surfaces as
/// [`RequestError::SessionClosed`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    async fn send(&self, command: Command) -> Result<(), RequestError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RequestError::SessionClosed)
    }

    /// Returns a snapshot of the session state. Pure read.
    pub async fn get_state(&self) -> Result<ChatState, RequestError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::GetState { reply }).await?;
        response.await.map_err(|_| RequestError::SessionClosed)
    }

    /// Posts a chat message.
    ///
    /// Streamed requests answer immediately with the live delta stream;
    /// non-streamed requests answer once the turn has completed, with the
    /// final state.
    pub async fn post_chat(&self, request: ChatRequest) -> Result<ChatReply, RequestError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::PostChat { request, reply }).await?;
        response.await.map_err(|_| RequestError::SessionClosed)?
    }

    /// Empties the message history and returns the new state. Idempotent.
    pub async fn clear_messages(&self) -> Result<ChatState, RequestError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::ClearMessages { reply }).await?;
        response.await.map_err(|_| RequestError::SessionClosed)
    }

    /// Updates the session's model for subsequent turns.
    pub async fn set_model(&self, model: impl Into<String>) -> Result<ChatState, RequestError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::SetModel {
            model: model.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| RequestError::SessionClosed)?
    }

    /// Stores a persona reference without validating its existence.
    pub async fn set_persona_ref(
        &self,
        persona_id: impl Into<String>,
    ) -> Result<(), RequestError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::SetPersonaRef {
            persona_id: persona_id.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| RequestError::SessionClosed)
    }
}
