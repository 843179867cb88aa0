//! Holds the single active sequence.

use std::collections::HashMap;

use cf_core::{Message, MessageId, MessageLookup, Sequence, SequenceSource};

use crate::error::EngineResult;

struct ActiveSequence {
    sequence: Sequence,
    index: HashMap<MessageId, usize>,
}

/// Owns at most one active sequence, loaded from a [`SequenceSource`].
///
/// [`load`](Self::load) is all-or-nothing: the replacement is fetched,
/// validated and indexed before it becomes visible, so a failed load leaves
/// the previous sequence active.
pub struct SequenceStore {
    source: Box<dyn SequenceSource>,
    active: Option<ActiveSequence>,
}

impl std::fmt::Debug for SequenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceStore")
            .field("active", &self.active_id())
            .finish()
    }
}

impl SequenceStore {
    /// Create a store with nothing loaded.
    pub fn new<S: SequenceSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            active: None,
        }
    }

    /// Load `id` and make it the active sequence.
    pub fn load(&mut self, id: &str) -> EngineResult<()> {
        let sequence = self.source.load(id)?;
        sequence.validate()?;
        let index = sequence
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();
        tracing::info!(
            sequence = %sequence.id,
            messages = sequence.messages.len(),
            "loaded sequence"
        );
        self.active = Some(ActiveSequence { sequence, index });
        Ok(())
    }

    /// The active sequence, if any.
    pub fn active(&self) -> Option<&Sequence> {
        self.active.as_ref().map(|a| &a.sequence)
    }

    /// The id of the active sequence, if any.
    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|s| s.id.as_str())
    }

    /// The first authored message of the active sequence.
    pub fn first_message_id(&self) -> Option<MessageId> {
        self.active().and_then(Sequence::first_message_id)
    }
}

impl MessageLookup for SequenceStore {
    fn get_message(&self, id: MessageId) -> Option<&Message> {
        let active = self.active.as_ref()?;
        active
            .index
            .get(&id)
            .and_then(|&i| active.sequence.messages.get(i))
    }
}
