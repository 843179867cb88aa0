//! Interactive chat session management.

use cf_core::{MessageId, MessageLookup, MessageType, StateValue};

use crate::error::{EngineError, EngineResult};
use crate::orchestrator::{FlowEngine, FlowResult};

/// A user's answer to an interactive message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserResponse {
    /// Index of the picked choice.
    Choice(usize),
    /// Free text for a text input.
    Text(String),
}

/// A conversation driven by user responses.
#[derive(Debug)]
pub struct ChatSession {
    engine: FlowEngine,
    last: Option<FlowResult>,
}

impl ChatSession {
    /// Wrap an engine. Call [`start`](Self::start) next.
    pub fn new(engine: FlowEngine) -> Self {
        Self { engine, last: None }
    }

    /// Get the engine.
    pub fn engine(&self) -> &FlowEngine {
        &self.engine
    }

    /// Get a mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut FlowEngine {
        &mut self.engine
    }

    /// The result of the most recent run.
    pub fn last_result(&self) -> Option<&FlowResult> {
        self.last.as_ref()
    }

    /// The message currently waiting for an answer.
    pub fn awaiting(&self) -> Option<MessageId> {
        self.last
            .as_ref()
            .filter(|r| r.awaiting_interaction)
            .and_then(|r| r.interaction_message_id)
    }

    /// Load `sequence_id` and run it from its first message.
    pub fn start(&mut self, sequence_id: &str) -> EngineResult<FlowResult> {
        self.engine.load_sequence(sequence_id)?;
        let result = match self.engine.sequences().first_message_id() {
            Some(first) => self.engine.process_from(first)?,
            None => FlowResult::finished(Vec::new(), true),
        };
        self.last = Some(result.clone());
        Ok(result)
    }

    /// Answer `message_id`, store the answer under its store key, and run the
    /// flow from the successor.
    ///
    /// Nothing is written when the response does not fit the message.
    pub fn submit_user_response(
        &mut self,
        message_id: MessageId,
        response: UserResponse,
    ) -> EngineResult<FlowResult> {
        let (value, next, store_key) = self.interpret(message_id, response)?;

        if let Some(key) = store_key {
            tracing::debug!(message = message_id, key = %key, value = %value, "storing response");
            self.engine.state_mut().set(&key, value)?;
        }

        let result = match next {
            Some(next) => self.engine.process_from(next)?,
            None => FlowResult::finished(Vec::new(), true),
        };
        self.last = Some(result.clone());
        Ok(result)
    }

    fn interpret(
        &self,
        message_id: MessageId,
        response: UserResponse,
    ) -> EngineResult<(StateValue, Option<MessageId>, Option<String>)> {
        let sequences = self.engine.sequences();
        if sequences.active().is_none() {
            return Err(EngineError::NoActiveSequence);
        }
        let message = sequences
            .get_message(message_id)
            .ok_or(EngineError::MessageNotFound(message_id))?;
        let fallthrough = message
            .next_message_id
            .or_else(|| message_id.checked_add(1));

        let (value, next) = match (message.message_type, response) {
            (MessageType::Choice, UserResponse::Choice(index)) => {
                let choice =
                    message
                        .choices
                        .get(index)
                        .ok_or_else(|| EngineError::InvalidResponse {
                            message_id,
                            reason: format!(
                                "choice {index} out of range ({} choices)",
                                message.choices.len()
                            ),
                        })?;
                (choice.stored_value(), choice.next_message_id.or(fallthrough))
            }
            (MessageType::TextInput, UserResponse::Text(text)) => {
                (StateValue::String(text), fallthrough)
            }
            (kind, response) => {
                return Err(EngineError::InvalidResponse {
                    message_id,
                    reason: format!("{response:?} does not answer a {kind} message"),
                });
            }
        };
        Ok((value, next, message.store_key.clone()))
    }
}
