//! Session domain module.
//!
//! Contains the conversation message types and the per-session chat state
//! that the session actor owns and mutates.

mod message;
mod model;

pub use message::{ChatMessage, MessageRole};
pub use model::ChatState;
