//! Session hub: resolves session ids to live actors.

use super::actor::{ActorConfig, SessionActor};
use super::handle::SessionHandle;
use confab_core::registry::SessionRegistry;
use confab_interaction::CompletionAgent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct HubEntry {
    handle: SessionHandle,
    last_access: Instant,
}

/// Maps session ids to actor instances with create-on-first-use.
///
/// Creation is single-flight: lookups and inserts happen under one write
/// lock, so exactly one actor is constructed per id even under
/// concurrent first access. Idle entries can be evicted to bound memory;
/// an evicted actor drains its in-flight turn before stopping, so
/// eviction never strands a turn.
pub struct SessionHub<A> {
    sessions: RwLock<HashMap<String, HubEntry>>,
    registry: Arc<dyn SessionRegistry>,
    agent: A,
    config: ActorConfig,
}

impl<A: CompletionAgent + Clone + 'static> SessionHub<A> {
    /// Creates a hub whose actors clone `agent` and report activity to
    /// `registry`.
    pub fn new(agent: A, registry: Arc<dyn SessionRegistry>) -> Self {
        Self::with_config(agent, registry, ActorConfig::default())
    }

    pub fn with_config(agent: A, registry: Arc<dyn SessionRegistry>, config: ActorConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            registry,
            agent,
            config,
        }
    }

    /// Returns the actor handle for `session_id`, spawning it on first
    /// access.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| HubEntry {
                handle: SessionActor::spawn(
                    session_id,
                    self.agent.clone(),
                    self.registry.clone(),
                    self.config.clone(),
                ),
                last_access: Instant::now(),
            });
        entry.last_access = Instant::now();
        entry.handle.clone()
    }

    /// Tears down the actor for `session_id`. Returns whether one existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Drops actors that have not been accessed within `max_idle`.
    /// Returns the number of evicted sessions.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_access.elapsed() < max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle session actors");
        }
        evicted
    }

    /// Number of live actors.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{NullRegistry, ScriptedAgent};
    use crate::session::{ChatReply, ChatRequest};

    fn hub(agent: ScriptedAgent) -> SessionHub<ScriptedAgent> {
        SessionHub::new(agent, Arc::new(NullRegistry::default()))
    }

    async fn run_credentialed_chat(handle: &SessionHandle, text: &str) {
        let reply = handle
            .post_chat(ChatRequest::new(text).with_api_key("key"))
            .await
            .unwrap();
        match reply {
            ChatReply::State(state) => assert!(!state.is_processing),
            ChatReply::Stream(_) => panic!("expected a non-streamed reply"),
        }
    }

    #[tokio::test]
    async fn actors_are_created_on_first_use_and_reused() {
        let hub = hub(ScriptedAgent::replying(&["ok"]));

        let first = hub.get_or_create("s1").await;
        run_credentialed_chat(&first, "hello").await;

        // The same actor (and so the same history) is resolved again.
        let second = hub.get_or_create("s1").await;
        let state = second.get_state().await.unwrap();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(hub.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_creates_one_actor() {
        let hub = Arc::new(hub(ScriptedAgent::replying(&["ok"])));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let hub = hub.clone();
                tokio::spawn(async move { hub.get_or_create("shared").await })
            })
            .collect();
        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        run_credentialed_chat(&handles[0], "hello").await;
        // Every resolved handle observes the same single conversation.
        for handle in &handles {
            assert_eq!(handle.get_state().await.unwrap().messages.len(), 2);
        }
        assert_eq!(hub.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let hub = hub(ScriptedAgent::replying(&["ok"]));

        let a = hub.get_or_create("a").await;
        let b = hub.get_or_create("b").await;
        run_credentialed_chat(&a, "hello").await;

        assert_eq!(a.get_state().await.unwrap().messages.len(), 2);
        assert!(b.get_state().await.unwrap().messages.is_empty());
        assert_eq!(hub.len().await, 2);
    }

    #[tokio::test]
    async fn remove_tears_down_the_actor_entry() {
        let hub = hub(ScriptedAgent::replying(&["ok"]));

        let handle = hub.get_or_create("gone").await;
        run_credentialed_chat(&handle, "hello").await;
        drop(handle);

        assert!(hub.remove("gone").await);
        assert!(!hub.remove("gone").await);
        assert_eq!(hub.len().await, 0);
        assert!(hub.is_empty().await);

        // A later access starts a fresh conversation.
        let fresh = hub.get_or_create("gone").await;
        assert!(fresh.get_state().await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn idle_actors_are_evicted() {
        let hub = hub(ScriptedAgent::replying(&["ok"]));

        hub.get_or_create("idle").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        hub.get_or_create("fresh").await;

        let evicted = hub.evict_idle(Duration::from_millis(100)).await;
        assert_eq!(evicted, 1);
        assert_eq!(hub.len().await, 1);
        assert_eq!(hub.evict_idle(Duration::from_secs(60)).await, 0);
    }
}
