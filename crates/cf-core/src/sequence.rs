use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::message::{Message, MessageId, MessageType};

/// Read access to messages by id.
pub trait MessageLookup {
    /// Get a message by id.
    fn get_message(&self, id: MessageId) -> Option<&Message>;

    /// Whether a message with this id exists.
    fn has_message(&self, id: MessageId) -> bool {
        self.get_message(id).is_some()
    }
}

/// A named, authored collection of messages forming one conversation segment.
///
/// Message order in `messages` carries no traversal meaning; the walk follows
/// ids. The first authored message is the sequence's entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Unique sequence id, also its file name.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Free-form authoring notes.
    #[serde(default)]
    pub description: String,
    /// Authored messages.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Sequence {
    /// Create an empty sequence.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            messages: Vec::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a message.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// The id of the first authored message.
    pub fn first_message_id(&self) -> Option<MessageId> {
        self.messages.first().map(|m| m.id)
    }

    /// Check the invariants every loaded sequence must hold.
    pub fn validate(&self) -> CoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::InvalidSequence {
                sequence: self.id.clone(),
                reason: "sequence id is empty".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for message in &self.messages {
            if !seen.insert(message.id) {
                return Err(CoreError::DuplicateMessageId {
                    sequence: self.id.clone(),
                    id: message.id,
                });
            }
        }
        Ok(())
    }

    /// Report authoring problems that do not prevent loading.
    pub fn lint(&self) -> Vec<SequenceIssue> {
        let mut issues = Vec::new();
        if self.messages.is_empty() {
            issues.push(SequenceIssue::sequence(IssueKind::EmptySequence));
        }

        for message in &self.messages {
            let id = message.id;
            if let Some(next) = message.next_message_id
                && !self.has_message(next)
            {
                issues.push(SequenceIssue::at(id, IssueKind::DanglingNext { target: next }));
            }

            match message.message_type {
                MessageType::Choice => {
                    if message.choices.is_empty() {
                        issues.push(SequenceIssue::at(id, IssueKind::MissingChoices));
                    }
                    for (index, choice) in message.choices.iter().enumerate() {
                        if let Some(target) = choice.next_message_id
                            && !self.has_message(target)
                        {
                            issues.push(SequenceIssue::at(
                                id,
                                IssueKind::DanglingChoice { index, target },
                            ));
                        }
                    }
                }
                MessageType::Autoroute => {
                    if message.routes.is_empty() {
                        issues.push(SequenceIssue::at(id, IssueKind::MissingRoutes));
                    }
                    let defaults = message.routes.iter().filter(|r| r.is_default).count();
                    if defaults > 1 {
                        issues.push(SequenceIssue::at(id, IssueKind::MultipleDefaults));
                    }
                    for (index, route) in message.routes.iter().enumerate() {
                        let blank = route
                            .condition
                            .as_deref()
                            .is_none_or(|c| c.trim().is_empty());
                        if !route.is_default && blank {
                            issues.push(SequenceIssue::at(
                                id,
                                IssueKind::MissingCondition { index },
                            ));
                        }
                        if route.target().is_none() {
                            issues.push(SequenceIssue::at(id, IssueKind::MissingTarget { index }));
                        }
                        if let Some(target) = route.next_message_id
                            && !self.has_message(target)
                        {
                            issues.push(SequenceIssue::at(
                                id,
                                IssueKind::DanglingRoute { index, target },
                            ));
                        }
                    }
                }
                MessageType::DataAction => {
                    if message.data_actions.is_empty() {
                        issues.push(SequenceIssue::at(id, IssueKind::MissingActions));
                    }
                }
                MessageType::Text | MessageType::TextInput | MessageType::System => {}
            }
        }
        issues
    }
}

impl MessageLookup for Sequence {
    fn get_message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// An authoring problem found by [`Sequence::lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceIssue {
    /// The message the issue belongs to, or `None` for the whole sequence.
    pub message_id: Option<MessageId>,
    /// What is wrong.
    pub kind: IssueKind,
}

impl SequenceIssue {
    fn at(message_id: MessageId, kind: IssueKind) -> Self {
        Self {
            message_id: Some(message_id),
            kind,
        }
    }

    fn sequence(kind: IssueKind) -> Self {
        Self {
            message_id: None,
            kind,
        }
    }
}

impl fmt::Display for SequenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_id {
            Some(id) => write!(f, "message {id}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// The kinds of problem [`Sequence::lint`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The sequence has no messages.
    EmptySequence,
    /// A choice message offers no choices.
    MissingChoices,
    /// An autoroute message has no routes.
    MissingRoutes,
    /// A data action message has no actions.
    MissingActions,
    /// More than one route is marked default.
    MultipleDefaults,
    /// A non-default route has no condition and can never match.
    MissingCondition {
        /// Route position.
        index: usize,
    },
    /// A route has neither a message nor a sequence target; when it matches
    /// the flow ends there.
    MissingTarget {
        /// Route position.
        index: usize,
    },
    /// `nextMessageId` points at no message in this sequence.
    DanglingNext {
        /// The missing id.
        target: MessageId,
    },
    /// A choice points at no message in this sequence.
    DanglingChoice {
        /// Choice position.
        index: usize,
        /// The missing id.
        target: MessageId,
    },
    /// A route points at no message in this sequence.
    DanglingRoute {
        /// Route position.
        index: usize,
        /// The missing id.
        target: MessageId,
    },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySequence => write!(f, "sequence has no messages"),
            Self::MissingChoices => write!(f, "choice message has no choices"),
            Self::MissingRoutes => write!(f, "autoroute message has no routes"),
            Self::MissingActions => write!(f, "dataAction message has no actions"),
            Self::MultipleDefaults => write!(f, "more than one default route"),
            Self::MissingCondition { index } => {
                write!(f, "route {index} is not default and has no condition")
            }
            Self::MissingTarget { index } => write!(f, "route {index} has no target"),
            Self::DanglingNext { target } => write!(f, "nextMessageId {target} does not exist"),
            Self::DanglingChoice { index, target } => {
                write!(f, "choice {index} points to missing message {target}")
            }
            Self::DanglingRoute { index, target } => {
                write!(f, "route {index} points to missing message {target}")
            }
        }
    }
}
