//! Registry traits.
//!
//! These traits decouple the application layer from the storage mechanism.
//! Implementations must be write-through: a mutating call may only return
//! `Ok` once the corresponding durable write has succeeded, because the
//! registry is the sole source of truth across actor restarts.

use super::model::SessionInfo;
use crate::error::Result;
use crate::persona::Persona;

/// Durable directory of session bookkeeping records.
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Registers a session with `created_at == last_active == now`.
    ///
    /// When `title` is `None` a default derived from the creation
    /// timestamp is used. Overwrites any existing record with the same id.
    async fn add_session(&self, id: &str, title: Option<&str>) -> Result<SessionInfo>;

    /// Deletes a session record. Returns whether a deletion occurred;
    /// storage is only rewritten when it did.
    async fn remove_session(&self, id: &str) -> Result<bool>;

    /// Bumps `last_active` to now if the session exists; no-op otherwise.
    async fn touch_session(&self, id: &str) -> Result<()>;

    /// Replaces the title if the session exists. Returns the success flag.
    async fn rename_session(&self, id: &str, title: &str) -> Result<bool>;

    /// All sessions ordered by `last_active` descending (most recently
    /// active first). The ordering is part of the contract.
    async fn list_sessions(&self) -> Result<Vec<SessionInfo>>;

    /// Empties the collection and returns the prior count.
    async fn clear_all_sessions(&self) -> Result<usize>;
}

/// Durable directory of persona records.
#[async_trait::async_trait]
pub trait PersonaRegistry: Send + Sync {
    /// Inserts or overwrites a persona by id.
    async fn add_persona(&self, persona: Persona) -> Result<()>;

    /// Looks up a persona by id.
    async fn get_persona(&self, id: &str) -> Result<Option<Persona>>;

    /// Personas owned by [`Persona::SYSTEM_OWNER`], i.e. the public set.
    async fn list_public_personas(&self) -> Result<Vec<Persona>>;

    /// Personas whose `owner_id` matches exactly.
    async fn list_personas_by_owner(&self, owner_id: &str) -> Result<Vec<Persona>>;
}
