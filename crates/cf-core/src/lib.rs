//! Core types for chatflow: messages, sequences, and persisted state.
//!
//! This crate defines the authored data model the interpreter walks over and
//! the storage contracts it depends on. It performs no traversal itself; see
//! `cf-engine` for that.

/// Error types used throughout the crate.
pub mod error;
/// Messages, choices, routes, and data actions.
pub mod message;
/// Sequences and message lookup.
pub mod sequence;
/// Sources that load sequences by id.
pub mod source;
/// The persisted key-value state contract and its stores.
pub mod state;
/// Values held in persisted state.
pub mod value;

pub use error::{CoreError, CoreResult};
pub use message::{
    Choice, DataAction, DataActionType, Message, MessageId, MessageType, RouteCondition,
    RouteTarget,
};
pub use sequence::{IssueKind, MessageLookup, Sequence, SequenceIssue};
pub use source::{DirSequenceSource, MemorySequenceSource, SequenceSource};
pub use state::{JsonFileStateStore, MemoryStateStore, StateStore};
pub use value::StateValue;
