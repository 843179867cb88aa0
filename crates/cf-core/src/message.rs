use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::StateValue;

/// Identifier of a message, unique within its owning sequence.
pub type MessageId = u32;

/// The kind of an authored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    /// Plain displayed text.
    Text,
    /// Displayed text followed by a set of choices for the user.
    Choice,
    /// Displayed text followed by a free-text input.
    TextInput,
    /// Hidden conditional branch.
    Autoroute,
    /// Hidden state mutation.
    DataAction,
    /// Displayed system notice.
    System,
}

impl MessageType {
    /// Whether the flow must wait for the user after this message.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Choice | Self::TextInput)
    }

    /// Whether this message is resolved by routing rather than displayed.
    pub fn is_routing(self) -> bool {
        matches!(self, Self::Autoroute | Self::DataAction)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Choice => write!(f, "choice"),
            Self::TextInput => write!(f, "textInput"),
            Self::Autoroute => write!(f, "autoroute"),
            Self::DataAction => write!(f, "dataAction"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single authored message in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique within the owning sequence.
    pub id: MessageId,
    /// Decides whether the message is shown, waits for input, or routes.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Literal text; may contain the multi-part delimiter.
    #[serde(default)]
    pub text: String,
    /// Display delay in milliseconds.
    #[serde(default)]
    pub delay: u64,
    /// Explicit successor. Without it the walk continues at `id + 1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_message_id: Option<MessageId>,
    /// Marks this message as a boundary into another sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,
    /// State key that receives the user's response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_key: Option<String>,
    /// Semantic content key overriding the literal text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_key: Option<String>,
    /// Options for choice messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Ordered routes; only meaningful on autoroute messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteCondition>,
    /// State mutations applied by data action messages, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_actions: Vec<DataAction>,
}

impl Message {
    /// Create a message of any type with the given text.
    pub fn new(id: MessageId, message_type: MessageType, text: impl Into<String>) -> Self {
        Self {
            id,
            message_type,
            text: text.into(),
            delay: 0,
            next_message_id: None,
            sequence_id: None,
            store_key: None,
            content_key: None,
            choices: Vec::new(),
            routes: Vec::new(),
            data_actions: Vec::new(),
        }
    }

    /// Create a plain text message.
    pub fn text(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, MessageType::Text, text)
    }

    /// Create a choice message.
    pub fn choice(id: MessageId, text: impl Into<String>, choices: Vec<Choice>) -> Self {
        let mut message = Self::new(id, MessageType::Choice, text);
        message.choices = choices;
        message
    }

    /// Create a free-text input message.
    pub fn text_input(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, MessageType::TextInput, text)
    }

    /// Create an autoroute message.
    pub fn autoroute(id: MessageId, routes: Vec<RouteCondition>) -> Self {
        let mut message = Self::new(id, MessageType::Autoroute, "");
        message.routes = routes;
        message
    }

    /// Create a data action message.
    pub fn data_action(id: MessageId, actions: Vec<DataAction>) -> Self {
        let mut message = Self::new(id, MessageType::DataAction, "");
        message.data_actions = actions;
        message
    }

    /// Set the explicit successor.
    pub fn with_next(mut self, next: MessageId) -> Self {
        self.next_message_id = Some(next);
        self
    }

    /// Mark this message as a boundary into another sequence.
    pub fn with_sequence(mut self, sequence_id: impl Into<String>) -> Self {
        self.sequence_id = Some(sequence_id.into());
        self
    }

    /// Set the state key receiving the user's response.
    pub fn with_store_key(mut self, key: impl Into<String>) -> Self {
        self.store_key = Some(key.into());
        self
    }

    /// Set the semantic content key.
    pub fn with_content_key(mut self, key: impl Into<String>) -> Self {
        self.content_key = Some(key.into());
        self
    }

    /// Set the display delay in milliseconds.
    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }
}

/// An option offered by a choice message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Literal label.
    pub text: String,
    /// Semantic content key overriding the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_key: Option<String>,
    /// Value persisted when picked; the choice text is stored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StateValue>,
    /// Where the flow continues after this choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_message_id: Option<MessageId>,
}

impl Choice {
    /// Create a choice leading to `next`.
    pub fn new(text: impl Into<String>, next: MessageId) -> Self {
        Self {
            text: text.into(),
            content_key: None,
            value: None,
            next_message_id: Some(next),
        }
    }

    /// Set the stored value override.
    pub fn with_value(mut self, value: impl Into<StateValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the semantic content key.
    pub fn with_content_key(mut self, key: impl Into<String>) -> Self {
        self.content_key = Some(key.into());
        self
    }

    /// The value persisted when this choice is picked.
    pub fn stored_value(&self) -> StateValue {
        self.value
            .clone()
            .unwrap_or_else(|| StateValue::String(self.text.clone()))
    }
}

/// Where a matched route continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// A message in the active sequence.
    Message(MessageId),
    /// The first message of another sequence.
    Sequence(String),
}

/// One branch of an autoroute message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCondition {
    /// Expression evaluated against state; ignored on default routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Taken only when no conditional route matches.
    #[serde(default)]
    pub is_default: bool,
    /// Target message in the active sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_message_id: Option<MessageId>,
    /// Target sequence; used when no message target is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,
}

impl RouteCondition {
    /// A conditional route to a message.
    pub fn when(condition: impl Into<String>, next: MessageId) -> Self {
        Self {
            condition: Some(condition.into()),
            is_default: false,
            next_message_id: Some(next),
            sequence_id: None,
        }
    }

    /// A conditional route into another sequence.
    pub fn when_sequence(condition: impl Into<String>, sequence_id: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            is_default: false,
            next_message_id: None,
            sequence_id: Some(sequence_id.into()),
        }
    }

    /// A default route to a message.
    pub fn fallback(next: MessageId) -> Self {
        Self {
            condition: None,
            is_default: true,
            next_message_id: Some(next),
            sequence_id: None,
        }
    }

    /// A default route into another sequence.
    pub fn fallback_sequence(sequence_id: impl Into<String>) -> Self {
        Self {
            condition: None,
            is_default: true,
            next_message_id: None,
            sequence_id: Some(sequence_id.into()),
        }
    }

    /// The continuation of this route. `nextMessageId` wins over `sequenceId`.
    pub fn target(&self) -> Option<RouteTarget> {
        if let Some(next) = self.next_message_id {
            return Some(RouteTarget::Message(next));
        }
        self.sequence_id
            .as_ref()
            .map(|id| RouteTarget::Sequence(id.clone()))
    }
}

/// The kind of state mutation a data action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataActionType {
    /// Store a value, resolving template functions.
    Set,
    /// Add a delta, 1 by default.
    Increment,
    /// Subtract a delta, 1 by default.
    Decrement,
    /// Replace with the type's zero value.
    Reset,
}

impl fmt::Display for DataActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::Increment => write!(f, "increment"),
            Self::Decrement => write!(f, "decrement"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// A single mutation of persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAction {
    /// What the action does.
    #[serde(rename = "type")]
    pub action_type: DataActionType,
    /// Dot-namespaced state key.
    pub key: String,
    /// Literal value, template function name, or increment delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StateValue>,
}

impl DataAction {
    /// Store `value` under `key`.
    pub fn set(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Self {
            action_type: DataActionType::Set,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Add one to `key`.
    pub fn increment(key: impl Into<String>) -> Self {
        Self {
            action_type: DataActionType::Increment,
            key: key.into(),
            value: None,
        }
    }

    /// Subtract one from `key`.
    pub fn decrement(key: impl Into<String>) -> Self {
        Self {
            action_type: DataActionType::Decrement,
            key: key.into(),
            value: None,
        }
    }

    /// Reset `key` to its zero value.
    pub fn reset(key: impl Into<String>) -> Self {
        Self {
            action_type: DataActionType::Reset,
            key: key.into(),
            value: None,
        }
    }

    /// Attach a value (used as the delta for increment/decrement).
    pub fn with_value(mut self, value: impl Into<StateValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}
