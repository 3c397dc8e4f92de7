//! Session actor subsystem.
//!
//! - `protocol`: request/response types of the actor's external surface
//! - `actor`: the per-session actor task and its turn machinery
//! - `handle`: cloneable command-channel handle to one actor
//! - `hub`: session id to actor resolution with single-flight creation

mod actor;
mod handle;
mod hub;
mod protocol;

#[cfg(test)]
pub(crate) mod testing;

pub use actor::{ActorConfig, CRAFTING_NOTICE, GENERIC_ERROR_REPLY};
pub use handle::SessionHandle;
pub use hub::SessionHub;
pub use protocol::{ChatReply, ChatRequest, RequestError};
