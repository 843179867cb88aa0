//! Semantic content resolution for chatflow.
//!
//! A semantic key such as `bot.acknowledge.completion.celebratory` names a
//! family of authored text variants. The [`ContentResolver`] walks a fallback
//! chain of progressively less specific keys until a content store has
//! variants for one of them, picks a line, and caches it per input key.

/// Resolver configuration.
pub mod config;
/// Semantic key parsing and fallback chains.
pub mod key;
/// Resolution with caching.
pub mod resolver;
/// Content stores holding authored variants.
pub mod store;

pub use config::ContentConfig;
pub use key::SemanticKey;
pub use resolver::ContentResolver;
pub use store::{ContentStore, DirContentStore, MemoryContentStore};
