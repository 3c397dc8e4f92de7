//! Durable storage layer for Confab.
//!
//! Provides the atomic TOML collection files and the file-backed registry
//! implementing the `confab-core` registry traits with lazy hydration and
//! write-through persistence.

pub mod registry;
pub mod storage;

pub use registry::FileRegistry;
pub use storage::CollectionFile;
