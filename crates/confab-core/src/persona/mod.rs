//! Persona domain module.
//!
//! Personas are named character definitions (system prompt, greeting,
//! display metadata) that condition the assistant's responses.
//!
//! - `model`: the `Persona` record
//! - `preset`: the built-in seed set owned by `"system"`

mod model;
mod preset;

pub use model::Persona;
pub use preset::default_personas;
