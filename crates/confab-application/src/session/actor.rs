//! Per-session actor.
//!
//! Each session id gets one spawned task that exclusively owns the
//! session's `ChatState`. All operations arrive as commands over a
//! channel and are applied by the task itself, so there is no locking:
//! no two operations for the same id execute concurrently by
//! construction. A chat turn runs as a separate producer task that feeds
//! `TurnEvent`s back over a bounded channel; the actor keeps serving
//! commands (state reads, busy rejections) while applying those events,
//! which closes the check-then-set race around the processing flag and
//! keeps the externally observed message order monotonic.

use super::handle::SessionHandle;
use super::protocol::{ChatReply, ChatRequest, RequestError};
use confab_core::registry::SessionRegistry;
use confab_core::session::{ChatMessage, ChatState};
use confab_interaction::{CompletionAgent, CompletionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Placeholder streamed to shared-credential callers while they wait.
pub const CRAFTING_NOTICE: &str = "Crafting response... please wait.";

/// Assistant text a streamed conversation absorbs on upstream failure.
pub const GENERIC_ERROR_REPLY: &str = "Sorry, I encountered an error.";

const COMMAND_CAPACITY: usize = 32;
const TURN_EVENT_CAPACITY: usize = 32;
const STREAM_CAPACITY: usize = 64;

/// Tunable policy knobs of a session actor.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Delay imposed on streamed chats that rely on the shared default
    /// credential. A policy constant, not a protocol guarantee.
    pub shared_credential_delay: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            shared_credential_delay: Duration::from_secs(15),
        }
    }
}

pub(crate) enum Command {
    GetState {
        reply: oneshot::Sender<ChatState>,
    },
    PostChat {
        request: ChatRequest,
        reply: oneshot::Sender<Result<ChatReply, RequestError>>,
    },
    ClearMessages {
        reply: oneshot::Sender<ChatState>,
    },
    SetModel {
        model: String,
        reply: oneshot::Sender<Result<ChatState, RequestError>>,
    },
    SetPersonaRef {
        persona_id: String,
        reply: oneshot::Sender<()>,
    },
}

enum TurnEvent {
    /// Throttle placeholder text became the streaming buffer.
    Notice(String),
    /// The placeholder becomes its own finalized assistant message.
    NoticeFinalized,
    /// One decoded content delta.
    Delta(String),
    /// The turn succeeded with the accumulated reply.
    Completed(String),
    /// The turn failed before producing a reply.
    Failed(CompletionError),
}

struct InFlightTurn {
    events: mpsc::Receiver<TurnEvent>,
    /// Live stream to the caller; dropped once the turn finalizes.
    sink: Option<mpsc::Sender<String>>,
    /// Deferred reply of a non-streamed request.
    deferred: Option<oneshot::Sender<Result<ChatReply, RequestError>>>,
}

enum Step {
    Command(Option<Command>),
    Turn(Option<TurnEvent>),
}

pub(crate) struct SessionActor<A> {
    state: ChatState,
    agent: A,
    registry: Arc<dyn SessionRegistry>,
    config: ActorConfig,
    commands: mpsc::Receiver<Command>,
    turn: Option<InFlightTurn>,
}

impl<A: CompletionAgent + Clone + 'static> SessionActor<A> {
    /// Spawns the actor task for `session_id` and returns its handle.
    pub(crate) fn spawn(
        session_id: &str,
        agent: A,
        registry: Arc<dyn SessionRegistry>,
        config: ActorConfig,
    ) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let actor = SessionActor {
            state: ChatState::new(session_id, agent.model()),
            agent,
            registry,
            config,
            commands: commands_rx,
            turn: None,
        };
        tokio::spawn(actor.run());
        SessionHandle::new(commands_tx)
    }

    async fn run(mut self) {
        tracing::debug!(session_id = %self.state.session_id, "session actor started");
        loop {
            let step = match self.turn.as_mut() {
                Some(turn) => {
                    tokio::select! {
                        command = self.commands.recv() => Step::Command(command),
                        event = turn.events.recv() => Step::Turn(event),
                    }
                }
                None => Step::Command(self.commands.recv().await),
            };
            match step {
                Step::Command(Some(command)) => self.handle_command(command).await,
                Step::Command(None) => {
                    // Evicted or shut down. Finish any in-flight turn so
                    // the conversation is finalized and a deferred caller
                    // still gets an answer.
                    self.drain_turn().await;
                    break;
                }
                Step::Turn(Some(event)) => self.apply_turn_event(event).await,
                Step::Turn(None) => {
                    self.apply_turn_event(TurnEvent::Failed(CompletionError::Transport(
                        "turn ended without a result".to_string(),
                    )))
                    .await;
                }
            }
        }
        tracing::debug!(session_id = %self.state.session_id, "session actor stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::GetState { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Command::PostChat { request, reply } => self.handle_post_chat(request, reply).await,
            Command::ClearMessages { reply } => {
                self.state.messages.clear();
                let _ = reply.send(self.state.clone());
            }
            Command::SetModel { model, reply } => {
                let model = model.trim().to_string();
                if model.is_empty() {
                    let _ = reply.send(Err(RequestError::MissingModel));
                } else {
                    self.adopt_model(&model);
                    let _ = reply.send(Ok(self.state.clone()));
                }
            }
            Command::SetPersonaRef { persona_id, reply } => {
                // Existence validation belongs to the registry-facing caller.
                self.state.persona_id = Some(persona_id);
                let _ = reply.send(());
            }
        }
    }

    fn adopt_model(&mut self, model: &str) {
        if self.state.model != model {
            self.state.model = model.to_string();
            self.agent.set_model(model);
        }
    }

    async fn handle_post_chat(
        &mut self,
        request: ChatRequest,
        reply: oneshot::Sender<Result<ChatReply, RequestError>>,
    ) {
        let text = request.message.trim().to_string();
        if text.is_empty() {
            let _ = reply.send(Err(RequestError::EmptyMessage));
            return;
        }
        if self.state.is_processing {
            let _ = reply.send(Err(RequestError::Busy));
            return;
        }
        if let Some(model) = request.model.as_deref() {
            let model = model.trim();
            if !model.is_empty() {
                self.adopt_model(model);
            }
        }

        // The user message is visible to state reads before the reply
        // completes.
        self.state.messages.push(ChatMessage::user(text.clone()));
        self.state.is_processing = true;
        if request.stream {
            self.state.streaming_buffer = Some(String::new());
        }

        // Activity bookkeeping; a registry hiccup must not kill the chat.
        if let Err(err) = self.registry.touch_session(&self.state.session_id).await {
            tracing::warn!(
                %err,
                session_id = %self.state.session_id,
                "failed to record session activity"
            );
        }

        let throttle = (request.stream && request.api_key.is_none())
            .then_some(self.config.shared_credential_delay);
        let input = TurnInput {
            agent: self.agent.clone(),
            history: self.state.messages.clone(),
            user_text: text,
            persona_prompt: request.persona,
            credential: request.api_key,
            streaming: request.stream,
            throttle,
        };
        let (events_tx, events_rx) = mpsc::channel(TURN_EVENT_CAPACITY);
        tokio::spawn(run_turn(input, events_tx));

        if request.stream {
            let (sink_tx, sink_rx) = mpsc::channel(STREAM_CAPACITY);
            self.turn = Some(InFlightTurn {
                events: events_rx,
                sink: Some(sink_tx),
                deferred: None,
            });
            let _ = reply.send(Ok(ChatReply::Stream(sink_rx)));
        } else {
            self.turn = Some(InFlightTurn {
                events: events_rx,
                sink: None,
                deferred: Some(reply),
            });
        }
    }

    async fn apply_turn_event(&mut self, event: TurnEvent) {
        match event {
            TurnEvent::Notice(text) => {
                self.state.streaming_buffer = Some(text.clone());
                self.forward_to_sink(text).await;
            }
            TurnEvent::NoticeFinalized => {
                if let Some(content) = self.state.streaming_buffer.take() {
                    self.state.messages.push(ChatMessage::assistant(content));
                }
                self.state.streaming_buffer = Some(String::new());
            }
            TurnEvent::Delta(delta) => {
                self.state
                    .streaming_buffer
                    .get_or_insert_with(String::new)
                    .push_str(&delta);
                self.forward_to_sink(delta).await;
            }
            TurnEvent::Completed(content) => {
                self.state.messages.push(ChatMessage::assistant(content));
                self.finalize_turn(false).await;
            }
            TurnEvent::Failed(err) => {
                tracing::error!(
                    %err,
                    session_id = %self.state.session_id,
                    "chat turn failed"
                );
                self.finalize_turn(true).await;
            }
        }
    }

    /// Ends the in-flight turn, releasing the processing flag no matter
    /// what happened.
    async fn finalize_turn(&mut self, failed: bool) {
        let Some(mut turn) = self.turn.take() else {
            return;
        };
        if failed {
            match turn.deferred.take() {
                // A non-streamed turn failed before any streaming began:
                // report it to the caller, append nothing.
                Some(reply) => {
                    self.state.is_processing = false;
                    self.state.streaming_buffer = None;
                    let _ = reply.send(Err(RequestError::ProcessingFailed));
                    return;
                }
                // A streamed conversation absorbs the failure as an
                // assistant turn; the caller's stream just ends with it.
                None => {
                    if let Some(sink) = &turn.sink {
                        let _ = sink.send(GENERIC_ERROR_REPLY.to_string()).await;
                    }
                    self.state
                        .messages
                        .push(ChatMessage::assistant(GENERIC_ERROR_REPLY));
                }
            }
        }
        self.state.is_processing = false;
        self.state.streaming_buffer = None;
        if let Some(reply) = turn.deferred.take() {
            let _ = reply.send(Ok(ChatReply::State(self.state.clone())));
        }
        // Dropping the turn closes the caller's stream.
    }

    async fn forward_to_sink(&mut self, text: String) {
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        if let Some(sink) = &turn.sink {
            if sink.send(text).await.is_err() {
                // Caller went away mid-stream; keep accumulating so the
                // assistant message can still be finalized.
                tracing::debug!(
                    session_id = %self.state.session_id,
                    "live stream receiver dropped"
                );
                turn.sink = None;
            }
        }
    }

    async fn drain_turn(&mut self) {
        while let Some(turn) = self.turn.as_mut() {
            let event = match turn.events.recv().await {
                Some(event) => event,
                None => TurnEvent::Failed(CompletionError::Transport(
                    "turn ended without a result".to_string(),
                )),
            };
            self.apply_turn_event(event).await;
        }
    }
}

struct TurnInput<A> {
    agent: A,
    history: Vec<ChatMessage>,
    user_text: String,
    persona_prompt: Option<String>,
    credential: Option<String>,
    streaming: bool,
    throttle: Option<Duration>,
}

/// Drives one chat turn: optional throttle phase, then the upstream
/// call, relaying deltas to the actor in read order.
async fn run_turn<A: CompletionAgent + 'static>(
    input: TurnInput<A>,
    events: mpsc::Sender<TurnEvent>,
) {
    if let Some(delay) = input.throttle {
        if events
            .send(TurnEvent::Notice(CRAFTING_NOTICE.to_string()))
            .await
            .is_err()
        {
            return;
        }
        tokio::time::sleep(delay).await;
        if events.send(TurnEvent::NoticeFinalized).await.is_err() {
            return;
        }
    }

    let (delta_tx, mut delta_rx) = mpsc::channel(TURN_EVENT_CAPACITY);
    let sink = input.streaming.then_some(delta_tx);
    let call = tokio::spawn(async move {
        input
            .agent
            .complete(
                &input.history,
                &input.user_text,
                input.persona_prompt.as_deref(),
                input.credential.as_deref(),
                sink,
            )
            .await
    });

    while let Some(delta) = delta_rx.recv().await {
        if events.send(TurnEvent::Delta(delta)).await.is_err() {
            // The actor is gone; nobody is left to consume the result.
            return;
        }
    }

    let event = match call.await {
        Ok(Ok(content)) => TurnEvent::Completed(content),
        Ok(Err(err)) => TurnEvent::Failed(err),
        Err(err) => TurnEvent::Failed(CompletionError::Transport(format!(
            "turn task failed: {err}"
        ))),
    };
    let _ = events.send(event).await;
}

#[cfg(test)]
#[path = "actor_test.rs"]
mod tests;
