//! Conversation-flow interpreter for chatflow.
//!
//! Walks the message graph of the active sequence, resolves autoroute and
//! data action messages, swaps sequences at boundaries, and renders the
//! collected messages into display-ready text. Execution is single-threaded
//! and sequential: one [`FlowEngine::process_from`] call per session at a time.

/// Data action processing and template values.
pub mod actions;
/// Date source for template values.
pub mod clock;
/// Condition expression evaluation.
pub mod condition;
/// Engine configuration.
pub mod config;
/// Error types for the engine.
pub mod error;
/// The sequential control loop.
pub mod orchestrator;
/// Display rendering of collected messages.
pub mod render;
/// Autoroute and data action continuation.
pub mod route;
/// Interactive chat session on top of the engine.
pub mod session;
/// The single active sequence.
pub mod sequence_store;
/// Pure traversal of the message graph.
pub mod walker;

pub use actions::DataActionProcessor;
pub use clock::{Clock, FixedClock, SystemClock};
pub use condition::{Condition, evaluate};
pub use config::FlowConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::{FlowEngine, FlowResult};
pub use render::{DisplayChoice, DisplayMessage, Renderer};
pub use session::{ChatSession, UserResponse};
pub use sequence_store::SequenceStore;
pub use walker::{StopReason, WalkResult, walk_from};
