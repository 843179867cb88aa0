//! Continuation of autoroute and data action messages.

use cf_core::{Message, MessageId, RouteCondition, RouteTarget, StateStore};

use crate::actions::DataActionProcessor;
use crate::condition;
use crate::error::EngineResult;
use crate::sequence_store::SequenceStore;

/// Resolve an autoroute message to the id the flow continues at.
///
/// Non-default routes are tried in authored order and the first true one
/// decides, even when it has no target; default routes only when none of
/// them matched. A route into another sequence loads it and continues
/// at its first message. With no match the message's own `nextMessageId` is
/// used. A failed sequence load is returned as an error.
pub fn process_auto_route(
    message: &Message,
    state: &dyn StateStore,
    sequences: &mut SequenceStore,
) -> EngineResult<Option<MessageId>> {
    if message.routes.is_empty() {
        return Ok(message.next_message_id);
    }

    let conditional = message.routes.iter().filter(|r| !r.is_default).find(|r| {
        r.condition
            .as_deref()
            .is_some_and(|c| condition::evaluate(c, state))
    });
    if let Some(route) = conditional {
        tracing::debug!(message = message.id, condition = ?route.condition, "route matched");
        return follow(route, sequences);
    }

    if let Some(route) = message.routes.iter().find(|r| r.is_default) {
        tracing::debug!(message = message.id, "default route taken");
        return follow(route, sequences);
    }

    tracing::debug!(message = message.id, "no route matched");
    Ok(message.next_message_id)
}

fn follow(route: &RouteCondition, sequences: &mut SequenceStore) -> EngineResult<Option<MessageId>> {
    match route.target() {
        Some(RouteTarget::Message(id)) => Ok(Some(id)),
        Some(RouteTarget::Sequence(id)) => {
            sequences.load(&id)?;
            Ok(sequences.first_message_id())
        }
        None => Ok(None),
    }
}

/// Apply a data action message's actions and return its `nextMessageId`.
///
/// A failing action is logged and skipped; the remaining actions still run.
pub fn process_data_action(
    message: &Message,
    processor: &DataActionProcessor,
    state: &mut dyn StateStore,
) -> Option<MessageId> {
    for action in &message.data_actions {
        if let Err(e) = processor.apply(action, state) {
            tracing::warn!(
                message = message.id,
                key = %action.key,
                error = %e,
                "data action failed, continuing"
            );
        }
    }
    message.next_message_id
}
