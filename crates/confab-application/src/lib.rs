//! Application layer for Confab.
//!
//! One logical actor per session id serializes all mutations of that
//! conversation's state and exposes a small request protocol: get state,
//! post chat, clear, set model, set persona reference. The session hub
//! resolves ids to live actors with single-flight creation and idle
//! eviction.

pub mod session;

pub use session::{
    ActorConfig, CRAFTING_NOTICE, ChatReply, ChatRequest, GENERIC_ERROR_REPLY, RequestError,
    SessionHandle, SessionHub,
};
