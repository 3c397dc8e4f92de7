//! Upstream interaction layer for Confab.
//!
//! Talks to an OpenAI-compatible chat-completion API: assembles the wire
//! message list, issues the request, and for streamed responses decodes
//! the event-stream body incrementally while forwarding deltas to a live
//! sink.

pub mod client;
pub mod config;
pub mod decoder;

pub use client::{CompletionAgent, CompletionClient, CompletionError};
pub use config::UpstreamConfig;
pub use decoder::FrameDecoder;
