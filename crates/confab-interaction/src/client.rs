//! Completion client - streaming proxy to an OpenAI-compatible API.

use crate::config::UpstreamConfig;
use crate::decoder::FrameDecoder;
use async_trait::async_trait;
use confab_core::session::{ChatMessage, MessageRole};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 1.0;
const MAX_TOKENS: u32 = 1024;

/// Failure modes of one completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The upstream answered with a non-success status.
    #[error("upstream rejected the request with status {status}: {body}")]
    Api { status: u16, body: String },
    /// The call could not be completed at all.
    #[error("upstream transport failure: {0}")]
    Transport(String),
}

/// The seam between the session actor and the upstream API.
///
/// The session actor is generic over this trait so tests can drive turns
/// with a scripted agent instead of a live endpoint.
#[async_trait]
pub trait CompletionAgent: Send + Sync {
    /// Current default model id.
    fn model(&self) -> &str;

    /// Replaces the default model for subsequent calls.
    fn set_model(&mut self, model: &str);

    /// Issues one chat-completion call and returns the full reply text.
    ///
    /// `history` must end with the just-appended user message; assembly
    /// drops that trailing entry and appends `user_text` itself, so the
    /// upstream never receives a duplicated trailing user turn. When
    /// `sink` is present the call streams: every decoded delta is
    /// forwarded to the sink in transmission order and accumulated into
    /// the returned text. A closed sink does not abort the call.
    async fn complete(
        &self,
        history: &[ChatMessage],
        user_text: &str,
        persona_prompt: Option<&str>,
        credential: Option<&str>,
        sink: Option<mpsc::Sender<String>>,
    ) -> Result<String, CompletionError>;
}

/// Reqwest-backed [`CompletionAgent`].
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    config: UpstreamConfig,
}

impl CompletionClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Creates a client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(UpstreamConfig::from_env())
    }

    async fn consume_stream(
        &self,
        response: reqwest::Response,
        sink: mpsc::Sender<String>,
    ) -> Result<String, CompletionError> {
        let mut stream = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut accumulated = String::new();
        let mut sink_open = true;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(err) if accumulated.is_empty() => {
                    return Err(CompletionError::Transport(err.to_string()));
                }
                Err(err) => {
                    // Connection dropped mid-reply: keep what we have so
                    // the conversation can still be finalized.
                    tracing::warn!(%err, "upstream stream ended early, keeping partial reply");
                    break;
                }
            };
            for delta in decoder.decode(&chunk) {
                accumulated.push_str(&delta);
                if sink_open && sink.send(delta).await.is_err() {
                    tracing::debug!("live sink closed, continuing accumulation");
                    sink_open = false;
                }
            }
            if decoder.is_done() {
                break;
            }
        }
        Ok(accumulated)
    }
}

#[async_trait]
impl CompletionAgent for CompletionClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn set_model(&mut self, model: &str) {
        self.config.model = model.to_string();
    }

    async fn complete(
        &self,
        history: &[ChatMessage],
        user_text: &str,
        persona_prompt: Option<&str>,
        credential: Option<&str>,
        sink: Option<mpsc::Sender<String>>,
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: assemble_messages(history, user_text, persona_prompt),
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            stream: sink.is_some(),
        };
        // A caller-supplied credential overrides the shared default for
        // this call only.
        let api_key = credential.unwrap_or(&self.config.api_key);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read upstream error body".to_string());
            tracing::error!(status = status.as_u16(), "upstream completion rejected");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        match sink {
            Some(sink) => self.consume_stream(response, sink).await,
            None => {
                let parsed: CompletionResponse = response
                    .json()
                    .await
                    .map_err(|err| CompletionError::Transport(err.to_string()))?;
                Ok(parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default())
            }
        }
    }
}

/// Builds the upstream message list.
///
/// Order: optional persona system prompt first, then prior history with
/// the trailing just-appended user message dropped (system entries are
/// not replayed), then the new user text last.
fn assemble_messages<'a>(
    history: &'a [ChatMessage],
    user_text: &'a str,
    persona_prompt: Option<&'a str>,
) -> Vec<WireMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(prompt) = persona_prompt {
        messages.push(WireMessage {
            role: MessageRole::System.as_str(),
            content: prompt,
        });
    }
    let prior = history.len().saturating_sub(1);
    for message in &history[..prior] {
        if matches!(message.role, MessageRole::User | MessageRole::Assistant) {
            messages.push(WireMessage {
                role: message.role.as_str(),
                content: &message.content,
            });
        }
    }
    messages.push(WireMessage {
        role: MessageRole::User.as_str(),
        content: user_text,
    });
    messages
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire<'a>(role: &'static str, content: &'a str) -> WireMessage<'a> {
        WireMessage { role, content }
    }

    #[test]
    fn assembly_never_duplicates_the_trailing_user_turn() {
        let history = vec![
            ChatMessage::user("a"),
            ChatMessage::assistant("b"),
            ChatMessage::user("c"),
        ];
        let messages = assemble_messages(&history, "c", Some("P"));
        assert_eq!(
            messages,
            vec![
                wire("system", "P"),
                wire("user", "a"),
                wire("assistant", "b"),
                wire("user", "c"),
            ]
        );
    }

    #[test]
    fn assembly_without_persona_has_no_system_message() {
        let history = vec![ChatMessage::user("hi")];
        let messages = assemble_messages(&history, "hi", None);
        assert_eq!(messages, vec![wire("user", "hi")]);
    }

    #[test]
    fn assembly_skips_system_entries_in_history() {
        let history = vec![
            ChatMessage::new(MessageRole::System, "internal note"),
            ChatMessage::user("a"),
            ChatMessage::assistant("b"),
            ChatMessage::user("next"),
        ];
        let messages = assemble_messages(&history, "next", None);
        assert_eq!(
            messages,
            vec![wire("user", "a"), wire("assistant", "b"), wire("user", "next")]
        );
    }

    #[test]
    fn empty_history_yields_only_the_new_turn() {
        let messages = assemble_messages(&[], "hello", None);
        assert_eq!(messages, vec![wire("user", "hello")]);
    }

    #[test]
    fn request_serializes_with_wire_field_names() {
        let request = CompletionRequest {
            model: "m",
            messages: vec![wire("user", "hi")],
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
