//! Pure traversal of a sequence's message graph.
//!
//! The walker follows explicit `nextMessageId` links, or `id + 1` when none is
//! authored, until it reaches a natural stop. Autoroute messages stop the walk
//! so the caller can resolve the branch; data action messages are collected
//! and walked past.

use std::fmt;

use cf_core::{Message, MessageId, MessageLookup, MessageType};

/// Why a walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A choice or text input needs the user.
    InteractiveMessage,
    /// A message hands over to another sequence.
    SequenceBoundary,
    /// No successor, or an autoroute needing resolution.
    EndOfChain,
    /// The depth bound was hit.
    MaxDepthReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InteractiveMessage => write!(f, "interactiveMessage"),
            Self::SequenceBoundary => write!(f, "sequenceBoundary"),
            Self::EndOfChain => write!(f, "endOfChain"),
            Self::MaxDepthReached => write!(f, "maxDepthReached"),
        }
    }
}

/// The outcome of one walk.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkResult {
    /// Collected messages in visit order.
    pub messages: Vec<Message>,
    /// Why the walk stopped.
    pub stop_reason: StopReason,
    /// The message the walk stopped on, when it stopped on one.
    pub stop_message_id: Option<MessageId>,
    /// Set for [`StopReason::SequenceBoundary`].
    pub target_sequence_id: Option<String>,
}

impl WalkResult {
    fn stop(messages: Vec<Message>, stop_reason: StopReason) -> Self {
        Self {
            messages,
            stop_reason,
            stop_message_id: None,
            target_sequence_id: None,
        }
    }

    fn stop_at(messages: Vec<Message>, stop_reason: StopReason, id: MessageId) -> Self {
        Self {
            stop_message_id: Some(id),
            ..Self::stop(messages, stop_reason)
        }
    }
}

/// Walk from `start` through `lookup` for at most `max_depth` messages.
///
/// A chain that ends after exactly `max_depth` messages is a normal end;
/// [`StopReason::MaxDepthReached`] means a further message exists.
pub fn walk_from(start: MessageId, lookup: &dyn MessageLookup, max_depth: usize) -> WalkResult {
    let mut messages = Vec::new();
    let mut current = start;

    for _ in 0..max_depth {
        let Some(message) = lookup.get_message(current) else {
            tracing::debug!(id = current, "walk reached missing message");
            return WalkResult::stop(messages, StopReason::EndOfChain);
        };
        messages.push(message.clone());

        if message.message_type.is_interactive() {
            return WalkResult::stop_at(messages, StopReason::InteractiveMessage, current);
        }

        // Autoroute stops the walk; dataAction deliberately does not.
        if message.message_type == MessageType::Autoroute {
            return WalkResult::stop_at(messages, StopReason::EndOfChain, current);
        }

        if let Some(target) = &message.sequence_id {
            let target = target.clone();
            let mut result = WalkResult::stop_at(messages, StopReason::SequenceBoundary, current);
            result.target_sequence_id = Some(target);
            return result;
        }

        current = match message.next_message_id {
            Some(next) => next,
            None => match current.checked_add(1) {
                Some(next) => next,
                None => return WalkResult::stop(messages, StopReason::EndOfChain),
            },
        };
    }

    if lookup.get_message(current).is_none() {
        return WalkResult::stop(messages, StopReason::EndOfChain);
    }
    tracing::debug!(start, max_depth, "walk exceeded depth bound");
    WalkResult::stop(messages, StopReason::MaxDepthReached)
}
