//! Shared test doubles for the session actor and hub tests.

use async_trait::async_trait;
use chrono::Utc;
use confab_core::Result;
use confab_core::registry::{SessionInfo, SessionRegistry};
use confab_core::session::ChatMessage;
use confab_interaction::{CompletionAgent, CompletionError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc};

/// In-memory registry that only counts activity touches.
#[derive(Default)]
pub(crate) struct NullRegistry {
    pub(crate) touches: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionRegistry for NullRegistry {
    async fn add_session(&self, id: &str, title: Option<&str>) -> Result<SessionInfo> {
        let now = Utc::now();
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| SessionInfo::default_title(now));
        Ok(SessionInfo::new(id, title, now))
    }

    async fn remove_session(&self, _id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn touch_session(&self, _id: &str) -> Result<()> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rename_session(&self, _id: &str, _title: &str) -> Result<bool> {
        Ok(false)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        Ok(Vec::new())
    }

    async fn clear_all_sessions(&self) -> Result<usize> {
        Ok(0)
    }
}

/// Agent whose replies are scripted, with an optional gate that holds the
/// upstream call open until the test releases it.
#[derive(Clone)]
pub(crate) struct ScriptedAgent {
    deltas: Vec<String>,
    fail: bool,
    gate: Option<Arc<Notify>>,
    model: String,
}

impl ScriptedAgent {
    pub(crate) fn replying(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|s| s.to_string()).collect(),
            fail: false,
            gate: None,
            model: "test-model".to_string(),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            deltas: Vec::new(),
            fail: true,
            gate: None,
            model: "test-model".to_string(),
        }
    }

    /// The upstream call blocks until `gate` is notified.
    pub(crate) fn gated(deltas: &[&str], gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::replying(deltas)
        }
    }
}

#[async_trait]
impl CompletionAgent for ScriptedAgent {
    fn model(&self) -> &str {
        &self.model
    }

    fn set_model(&mut self, model: &str) {
        self.model = model.to_string();
    }

    async fn complete(
        &self,
        _history: &[ChatMessage],
        _user_text: &str,
        _persona_prompt: Option<&str>,
        _credential: Option<&str>,
        sink: Option<mpsc::Sender<String>>,
    ) -> std::result::Result<String, CompletionError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(CompletionError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        let mut accumulated = String::new();
        for delta in &self.deltas {
            accumulated.push_str(delta);
            if let Some(sink) = &sink {
                let _ = sink.send(delta.clone()).await;
            }
        }
        Ok(accumulated)
    }
}
