//! Domain layer for Confab.
//!
//! This crate holds the models and contracts shared by every other layer:
//! conversation messages and per-session chat state, persona definitions
//! (including the built-in seed set), the registry records and traits that
//! decouple the application layer from durable storage, and the shared
//! error type.

pub mod error;
pub mod persona;
pub mod registry;
pub mod session;

// Re-export common error type
pub use error::{ConfabError, Result};
