//! The sequential control loop.

use serde::Serialize;

use cf_content::{ContentResolver, ContentStore};
use cf_core::{Message, MessageId, MessageType, SequenceSource, StateStore};

use crate::actions::DataActionProcessor;
use crate::clock::Clock;
use crate::config::FlowConfig;
use crate::error::{EngineError, EngineResult};
use crate::render::{DisplayMessage, Renderer};
use crate::route;
use crate::sequence_store::SequenceStore;
use crate::walker::{StopReason, walk_from};

/// The rendered outcome of one [`FlowEngine::process_from`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    /// Rendered messages in display order.
    pub messages: Vec<DisplayMessage>,
    /// The flow stopped on a choice or text input.
    pub awaiting_interaction: bool,
    /// The message waiting for the user.
    pub interaction_message_id: Option<MessageId>,
    /// The flow ended naturally. False when awaiting input or truncated.
    pub complete: bool,
}

impl FlowResult {
    fn awaiting(messages: Vec<DisplayMessage>, id: Option<MessageId>) -> Self {
        Self {
            messages,
            awaiting_interaction: true,
            interaction_message_id: id,
            complete: false,
        }
    }

    pub(crate) fn finished(messages: Vec<DisplayMessage>, complete: bool) -> Self {
        Self {
            messages,
            awaiting_interaction: false,
            interaction_message_id: None,
            complete,
        }
    }

    /// Truncated by the cycle bound.
    pub fn is_truncated(&self) -> bool {
        !self.awaiting_interaction && !self.complete
    }
}

/// Runs conversation flows over persisted state, sequences and content.
///
/// One engine serves one conversation. Calls must not overlap: state is
/// read and written without locking.
pub struct FlowEngine {
    config: FlowConfig,
    state: Box<dyn StateStore>,
    sequences: SequenceStore,
    content: ContentResolver,
    actions: DataActionProcessor,
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("config", &self.config)
            .field("sequences", &self.sequences)
            .field("content", &self.content)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl FlowEngine {
    /// Create an engine with nothing loaded.
    pub fn new<Q, S, C>(config: FlowConfig, sequences: Q, state: S, content: C) -> Self
    where
        Q: SequenceSource + 'static,
        S: StateStore + 'static,
        C: ContentStore + 'static,
    {
        let actions = DataActionProcessor::new(&config);
        let content = ContentResolver::new(content, config.content.clone());
        Self {
            config,
            state: Box::new(state),
            sequences: SequenceStore::new(sequences),
            content,
            actions,
        }
    }

    /// Use `clock` for date-valued template values.
    pub fn with_clock<K: Clock + 'static>(mut self, clock: K) -> Self {
        self.actions = self.actions.with_clock(clock);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Get the persisted state.
    pub fn state(&self) -> &dyn StateStore {
        self.state.as_ref()
    }

    /// Get a mutable reference to the persisted state.
    pub fn state_mut(&mut self) -> &mut dyn StateStore {
        self.state.as_mut()
    }

    /// Get the sequence store.
    pub fn sequences(&self) -> &SequenceStore {
        &self.sequences
    }

    /// Get the content resolver, e.g. to clear its cache.
    pub fn content_mut(&mut self) -> &mut ContentResolver {
        &mut self.content
    }

    /// Make `id` the active sequence.
    pub fn load_sequence(&mut self, id: &str) -> EngineResult<()> {
        self.sequences.load(id)
    }

    /// Run the flow from `start` until it needs the user, ends, or hits the
    /// cycle bound.
    ///
    /// A walk that exceeds the depth bound and a sequence that fails to load
    /// are errors. Exhausting the cycle bound is not: whatever was collected
    /// is returned with `complete == false`.
    pub fn process_from(&mut self, start: MessageId) -> EngineResult<FlowResult> {
        let mut pending: Vec<Message> = Vec::new();
        let mut current = start;

        for cycle in 0..self.config.max_cycles {
            let walk = walk_from(current, &self.sequences, self.config.max_walk_depth);
            tracing::debug!(
                cycle,
                from = current,
                collected = walk.messages.len(),
                stop = %walk.stop_reason,
                "walked"
            );
            if walk.stop_reason == StopReason::MaxDepthReached {
                return Err(EngineError::MaxDepthExceeded {
                    start: current,
                    max_depth: self.config.max_walk_depth,
                });
            }

            let last = walk.messages.len().checked_sub(1);
            let mut continuation = None;
            for (i, message) in walk.messages.into_iter().enumerate() {
                let next = match message.message_type {
                    MessageType::Autoroute => route::process_auto_route(
                        &message,
                        self.state.as_ref(),
                        &mut self.sequences,
                    )?,
                    MessageType::DataAction => {
                        route::process_data_action(&message, &self.actions, self.state.as_mut())
                    }
                    _ => {
                        pending.push(message);
                        continue;
                    }
                };
                if Some(i) == last {
                    continuation = next;
                }
            }

            match walk.stop_reason {
                StopReason::InteractiveMessage => {
                    let messages = self.render(&pending);
                    return Ok(FlowResult::awaiting(messages, walk.stop_message_id));
                }
                StopReason::SequenceBoundary => {
                    let Some(target) = walk.target_sequence_id else {
                        break;
                    };
                    self.sequences.load(&target)?;
                    match self.sequences.first_message_id() {
                        Some(first) => current = first,
                        None => return Ok(self.finish(&pending)),
                    }
                }
                _ => match continuation {
                    Some(next) => current = next,
                    None => return Ok(self.finish(&pending)),
                },
            }
        }

        tracing::warn!(
            start,
            max_cycles = self.config.max_cycles,
            "cycle limit reached, returning truncated flow"
        );
        let messages = self.render(&pending);
        Ok(FlowResult::finished(messages, false))
    }

    fn finish(&mut self, pending: &[Message]) -> FlowResult {
        let messages = self.render(pending);
        FlowResult::finished(messages, true)
    }

    fn render(&mut self, messages: &[Message]) -> Vec<DisplayMessage> {
        Renderer::new(
            self.state.as_ref(),
            &mut self.content,
            &self.config.part_delimiter,
        )
        .render(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_content::MemoryContentStore;
    use cf_core::{
        Choice, DataAction, MemorySequenceSource, MemoryStateStore, RouteCondition, Sequence,
        StateValue,
    };

    fn engine(sequences: MemorySequenceSource) -> FlowEngine {
        FlowEngine::new(
            FlowConfig::default(),
            sequences,
            MemoryStateStore::new(),
            MemoryContentStore::new(),
        )
    }

    fn texts(result: &FlowResult) -> Vec<&str> {
        result.messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn stops_at_interaction() {
        let source = MemorySequenceSource::new().with(
            Sequence::new("s")
                .with_message(Message::text(1, "Hi"))
                .with_message(Message::choice(2, "Ready?", vec![Choice::new("Yes", 3)]))
                .with_message(Message::text(3, "Go")),
        );
        let mut engine = engine(source);
        engine.load_sequence("s").unwrap();
        let result = engine.process_from(1).unwrap();
        assert!(result.awaiting_interaction);
        assert!(!result.complete);
        assert_eq!(result.interaction_message_id, Some(2));
        assert_eq!(texts(&result), vec!["Hi", "Ready?"]);
    }

    #[test]
    fn trailing_data_action_is_applied() {
        let source = MemorySequenceSource::new().with(
            Sequence::new("s")
                .with_message(Message::text(1, "Bye"))
                .with_message(Message::data_action(2, vec![DataAction::set("done", true)])),
        );
        let mut engine = engine(source);
        engine.load_sequence("s").unwrap();
        let result = engine.process_from(1).unwrap();
        assert!(result.complete);
        assert_eq!(texts(&result), vec!["Bye"]);
        assert_eq!(engine.state().get("done"), Some(StateValue::Bool(true)));
    }

    #[test]
    fn boundary_into_empty_sequence_completes() {
        let source = MemorySequenceSource::new()
            .with(Sequence::new("s").with_message(Message::text(1, "Off we go").with_sequence("empty")))
            .with(Sequence::new("empty"));
        let mut engine = engine(source);
        engine.load_sequence("s").unwrap();
        let result = engine.process_from(1).unwrap();
        assert!(result.complete);
        assert_eq!(texts(&result), vec!["Off we go"]);
        assert_eq!(engine.sequences().active_id(), Some("empty"));
    }

    #[test]
    fn boundary_into_missing_sequence_errors() {
        let source = MemorySequenceSource::new()
            .with(Sequence::new("s").with_message(Message::text(1, "x").with_sequence("ghost")));
        let mut engine = engine(source);
        engine.load_sequence("s").unwrap();
        assert!(matches!(
            engine.process_from(1),
            Err(EngineError::Core(cf_core::CoreError::SequenceNotFound(_)))
        ));
        assert_eq!(engine.sequences().active_id(), Some("s"));
    }

    #[test]
    fn walk_loop_is_fatal() {
        let source = MemorySequenceSource::new().with(
            Sequence::new("s")
                .with_message(Message::text(1, "a"))
                .with_message(Message::text(2, "b").with_next(1)),
        );
        let mut engine = engine(source);
        engine.load_sequence("s").unwrap();
        assert!(matches!(
            engine.process_from(1),
            Err(EngineError::MaxDepthExceeded { start: 1, max_depth: 50 })
        ));
    }

    #[test]
    fn chain_at_depth_bound_completes() {
        let mut seq = Sequence::new("s");
        for id in 1..=50 {
            seq = seq.with_message(Message::text(id, format!("line {id}")));
        }
        let mut engine = engine(MemorySequenceSource::new().with(seq));
        engine.load_sequence("s").unwrap();
        let result = engine.process_from(1).unwrap();
        assert!(result.complete);
        assert_eq!(result.messages.len(), 50);
        assert_eq!(result.messages[49].text, "line 50");
    }

    #[test]
    fn content_cache_can_be_cleared() {
        let source = MemorySequenceSource::new().with(
            Sequence::new("s")
                .with_message(Message::text(1, "fallback").with_content_key("bot.greet.user")),
        );
        let mut engine = FlowEngine::new(
            FlowConfig::default(),
            source,
            MemoryStateStore::new(),
            MemoryContentStore::new().with("bot.greet.user", ["Hello!"]),
        );
        engine.load_sequence("s").unwrap();
        assert_eq!(texts(&engine.process_from(1).unwrap()), vec!["Hello!"]);
        assert_eq!(engine.content_mut().cache_len(), 1);

        engine.content_mut().clear_cache();
        assert_eq!(engine.content_mut().cache_len(), 0);
        assert_eq!(texts(&engine.process_from(1).unwrap()), vec!["Hello!"]);
    }

    #[test]
    fn route_loop_is_truncated() {
        let source = MemorySequenceSource::new().with(
            Sequence::new("s")
                .with_message(Message::text(1, "again"))
                .with_message(Message::autoroute(2, vec![RouteCondition::fallback(1)])),
        );
        let mut engine = FlowEngine::new(
            FlowConfig::default().with_max_cycles(3),
            source,
            MemoryStateStore::new(),
            MemoryContentStore::new(),
        );
        engine.load_sequence("s").unwrap();
        let result = engine.process_from(1).unwrap();
        assert!(result.is_truncated());
        assert_eq!(texts(&result), vec!["again", "again", "again"]);
    }

    #[test]
    fn nothing_loaded_completes_empty() {
        let mut engine = engine(MemorySequenceSource::new());
        let result = engine.process_from(1).unwrap();
        assert!(result.complete);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = FlowResult::awaiting(Vec::new(), Some(4));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["awaitingInteraction"], true);
        assert_eq!(json["interactionMessageId"], 4);
        assert_eq!(json["complete"], false);
    }
}
