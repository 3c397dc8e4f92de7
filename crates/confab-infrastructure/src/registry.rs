//! File-backed durable registry.
//!
//! Holds the session and persona collections behind an in-memory cache
//! that is hydrated once per process lifetime from two TOML blobs. All
//! mutations write through to disk before returning; on a write failure
//! the cache keeps its previous contents, so cache and durable state
//! never diverge.

use crate::storage::CollectionFile;
use async_trait::async_trait;
use chrono::Utc;
use confab_core::persona::{Persona, default_personas};
use confab_core::registry::{PersonaRegistry, SessionInfo, SessionRegistry};
use confab_core::{ConfabError, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::{OnceCell, RwLock};

const SESSIONS_FILE: &str = "sessions.toml";
const PERSONAS_FILE: &str = "personas.toml";

#[derive(Default)]
struct RegistryCache {
    sessions: HashMap<String, SessionInfo>,
    personas: HashMap<String, Persona>,
}

/// Durable registry stored under one base directory.
///
/// Implements both [`SessionRegistry`] and [`PersonaRegistry`]. The first
/// access of any kind hydrates the cache; if the persona collection is
/// empty after load it is seeded with the built-in set and the seed is
/// persisted before hydration completes. Hydration runs under a one-shot
/// initialization cell, so concurrent first callers cannot load or seed
/// twice.
pub struct FileRegistry {
    sessions_file: CollectionFile<HashMap<String, SessionInfo>>,
    personas_file: CollectionFile<HashMap<String, Persona>>,
    cache: RwLock<RegistryCache>,
    hydrated: OnceCell<()>,
}

impl FileRegistry {
    /// Creates a registry rooted at `base_dir`. The directory and its
    /// collection files are created lazily on first write.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            sessions_file: CollectionFile::new(base_dir.join(SESSIONS_FILE)),
            personas_file: CollectionFile::new(base_dir.join(PERSONAS_FILE)),
            cache: RwLock::new(RegistryCache::default()),
            hydrated: OnceCell::new(),
        }
    }

    /// Creates a registry at the default location (`<config dir>/confab`).
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfabError::config("failed to determine the user config directory"))?;
        Ok(Self::new(config_dir.join("confab")))
    }

    async fn ensure_loaded(&self) -> Result<()> {
        self.hydrated
            .get_or_try_init(|| async {
                let sessions = self.sessions_file.load()?.unwrap_or_default();
                let mut personas = self.personas_file.load()?.unwrap_or_default();
                if personas.is_empty() {
                    for persona in default_personas() {
                        personas.insert(persona.id.clone(), persona);
                    }
                    self.personas_file.save(&personas)?;
                    tracing::info!(count = personas.len(), "seeded built-in personas");
                }
                let mut cache = self.cache.write().await;
                cache.sessions = sessions;
                cache.personas = personas;
                tracing::debug!(
                    sessions = cache.sessions.len(),
                    personas = cache.personas.len(),
                    "registry hydrated"
                );
                Ok(())
            })
            .await
            .copied()
    }
}

#[async_trait]
impl SessionRegistry for FileRegistry {
    async fn add_session(&self, id: &str, title: Option<&str>) -> Result<SessionInfo> {
        self.ensure_loaded().await?;
        let now = Utc::now();
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| SessionInfo::default_title(now));
        let info = SessionInfo::new(id, title, now);

        let mut cache = self.cache.write().await;
        let mut next = cache.sessions.clone();
        next.insert(id.to_string(), info.clone());
        self.sessions_file.save(&next)?;
        cache.sessions = next;
        Ok(info)
    }

    async fn remove_session(&self, id: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        let mut cache = self.cache.write().await;
        if !cache.sessions.contains_key(id) {
            return Ok(false);
        }
        let mut next = cache.sessions.clone();
        next.remove(id);
        self.sessions_file.save(&next)?;
        cache.sessions = next;
        Ok(true)
    }

    async fn touch_session(&self, id: &str) -> Result<()> {
        self.ensure_loaded().await?;
        let mut cache = self.cache.write().await;
        if !cache.sessions.contains_key(id) {
            return Ok(());
        }
        let mut next = cache.sessions.clone();
        if let Some(session) = next.get_mut(id) {
            session.last_active = Utc::now();
        }
        self.sessions_file.save(&next)?;
        cache.sessions = next;
        Ok(())
    }

    async fn rename_session(&self, id: &str, title: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        let mut cache = self.cache.write().await;
        if !cache.sessions.contains_key(id) {
            return Ok(false);
        }
        let mut next = cache.sessions.clone();
        if let Some(session) = next.get_mut(id) {
            session.title = title.to_string();
        }
        self.sessions_file.save(&next)?;
        cache.sessions = next;
        Ok(true)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        let mut sessions: Vec<SessionInfo> = cache.sessions.values().cloned().collect();
        // Most recently active first; the ordering is contractual.
        sessions.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(sessions)
    }

    async fn clear_all_sessions(&self) -> Result<usize> {
        self.ensure_loaded().await?;
        let mut cache = self.cache.write().await;
        let count = cache.sessions.len();
        self.sessions_file.save(&HashMap::new())?;
        cache.sessions.clear();
        Ok(count)
    }
}

#[async_trait]
impl PersonaRegistry for FileRegistry {
    async fn add_persona(&self, persona: Persona) -> Result<()> {
        self.ensure_loaded().await?;
        let mut cache = self.cache.write().await;
        let mut next = cache.personas.clone();
        next.insert(persona.id.clone(), persona);
        self.personas_file.save(&next)?;
        cache.personas = next;
        Ok(())
    }

    async fn get_persona(&self, id: &str) -> Result<Option<Persona>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache.personas.get(id).cloned())
    }

    async fn list_public_personas(&self) -> Result<Vec<Persona>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache
            .personas
            .values()
            .filter(|persona| persona.is_public())
            .cloned()
            .collect())
    }

    async fn list_personas_by_owner(&self, owner_id: &str) -> Result<Vec<Persona>> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache
            .personas
            .values()
            .filter(|persona| persona.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
