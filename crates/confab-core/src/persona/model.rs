//! Persona domain model.

use serde::{Deserialize, Serialize};

/// A named character definition that conditions the assistant's replies.
///
/// Personas are created once and never mutated in place. Ownership is
/// tracked by `owner_id`: the sentinel value [`Persona::SYSTEM_OWNER`]
/// marks a built-in persona that is listable by everyone; any other value
/// marks a user-owned persona visible only to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier (slug or UUID, treated as opaque)
    pub id: String,
    /// Display name
    pub name: String,
    /// Avatar image URL for display
    pub avatar_url: String,
    /// Greeting shown when a conversation with this persona starts
    pub greeting: String,
    /// Short description for listings
    pub description: String,
    /// System prompt injected as the first upstream message
    pub system_prompt: String,
    /// Owning user id, or [`Persona::SYSTEM_OWNER`] for built-ins
    pub owner_id: String,
}

impl Persona {
    /// Owner id marking a built-in, globally listable persona.
    pub const SYSTEM_OWNER: &'static str = "system";

    /// Whether this persona appears in public listings.
    pub fn is_public(&self) -> bool {
        self.owner_id == Self::SYSTEM_OWNER
    }
}
