//! Display rendering of collected messages.
//!
//! Rendering drops hidden routing messages, resolves each remaining message's
//! text (semantic content first, then `{key|default}` placeholders), and
//! splits multi-part texts into consecutive display messages.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use cf_content::ContentResolver;
use cf_core::{Message, MessageId, MessageType, StateStore};

/// A choice as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayChoice {
    /// Position in the authored choice list; used to answer the choice.
    pub index: usize,
    /// Resolved label.
    pub text: String,
}

/// A display-ready message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMessage {
    /// Id of the authored message; shared by all parts of a split text.
    pub id: MessageId,
    /// Type of the authored message.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Resolved, substituted text.
    pub text: String,
    /// Display delay in milliseconds.
    pub delay: u64,
    /// Choices, on the last part only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<DisplayChoice>,
    /// Where the user's answer will be stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_key: Option<String>,
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_.\-]+)(?:\|([^{}]*))?\}").expect("placeholder regex must compile")
    })
}

/// Replace `{key}` and `{key|default}` placeholders with state values.
///
/// A missing or null key renders its default, or nothing when there is none.
pub fn substitute_templates(text: &str, state: &dyn StateStore) -> String {
    if !text.contains('{') {
        return text.to_string();
    }
    placeholder_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            let key = &caps[1];
            match state.get(key) {
                Some(value) if !value.is_null() => value.to_string(),
                _ => caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            }
        })
        .into_owned()
}

/// Renders raw messages into display messages.
pub struct Renderer<'a> {
    state: &'a dyn StateStore,
    content: &'a mut ContentResolver,
    delimiter: &'a str,
}

impl<'a> Renderer<'a> {
    /// Render against `state`, resolving content keys through `content`.
    pub fn new(
        state: &'a dyn StateStore,
        content: &'a mut ContentResolver,
        delimiter: &'a str,
    ) -> Self {
        Self {
            state,
            content,
            delimiter,
        }
    }

    /// Render a batch, preserving order.
    pub fn render(&mut self, messages: &[Message]) -> Vec<DisplayMessage> {
        let mut out = Vec::with_capacity(messages.len());
        for message in messages {
            if message.message_type.is_routing() {
                continue;
            }
            let text = self.resolve_text(&message.text, message.content_key.as_deref());
            let choices: Vec<DisplayChoice> = message
                .choices
                .iter()
                .enumerate()
                .map(|(index, choice)| DisplayChoice {
                    index,
                    text: self.resolve_text(&choice.text, choice.content_key.as_deref()),
                })
                .collect();
            self.expand(message, text, choices, &mut out);
        }
        out
    }

    /// Resolve one text: semantic content when a key resolves, else the
    /// literal; placeholders are substituted either way.
    pub fn resolve_text(&mut self, literal: &str, content_key: Option<&str>) -> String {
        let base = match content_key {
            Some(key) => self.content.resolve(key, literal),
            None => literal.to_string(),
        };
        substitute_templates(&base, self.state)
    }

    fn expand(
        &self,
        message: &Message,
        text: String,
        choices: Vec<DisplayChoice>,
        out: &mut Vec<DisplayMessage>,
    ) {
        let make = |text: String, choices: Vec<DisplayChoice>| DisplayMessage {
            id: message.id,
            message_type: message.message_type,
            text,
            delay: message.delay,
            choices,
            store_key: message.store_key.clone(),
        };

        if self.delimiter.is_empty() || !text.contains(self.delimiter) {
            out.push(make(text, choices));
            return;
        }

        let parts: Vec<&str> = text
            .split(self.delimiter)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            out.push(make(String::new(), choices));
            return;
        }
        let last = parts.len() - 1;
        let mut choices = Some(choices);
        for (i, part) in parts.into_iter().enumerate() {
            let part_choices = if i == last {
                choices.take().unwrap_or_default()
            } else {
                Vec::new()
            };
            out.push(make(part.to_string(), part_choices));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_content::{ContentConfig, MemoryContentStore};
    use cf_core::{Choice, DataAction, MemoryStateStore, RouteCondition, StateValue};

    fn resolver(store: MemoryContentStore) -> ContentResolver {
        ContentResolver::new(store, ContentConfig::default())
    }

    #[test]
    fn placeholders_use_state_or_default() {
        let state = MemoryStateStore::new()
            .with("user.name", "Ana")
            .with("user.streak", 3)
            .with("user.cleared", StateValue::Null);
        assert_eq!(
            substitute_templates("Hi {user.name|friend}, day {user.streak}!", &state),
            "Hi Ana, day 3!"
        );
        assert_eq!(
            substitute_templates("Hi {user.nick|friend}{user.cleared|}.", &state),
            "Hi friend."
        );
        assert_eq!(substitute_templates("Hi {user.nick}!", &state), "Hi !");
        assert_eq!(substitute_templates("No braces", &state), "No braces");
        assert_eq!(substitute_templates("{ not a key }", &state), "{ not a key }");
    }

    #[test]
    fn routing_messages_are_dropped() {
        let state = MemoryStateStore::new();
        let mut content = resolver(MemoryContentStore::new());
        let messages = vec![
            Message::text(1, "shown"),
            Message::autoroute(2, vec![RouteCondition::fallback(3)]),
            Message::data_action(3, vec![DataAction::increment("n")]),
            Message::new(4, MessageType::System, "notice"),
        ];
        let out = Renderer::new(&state, &mut content, "|||").render(&messages);
        let ids: Vec<MessageId> = out.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn content_key_beats_literal() {
        let state = MemoryStateStore::new().with("user.name", "Ana");
        let mut content =
            resolver(MemoryContentStore::new().with("bot.greet.user", ["Welcome back, {user.name}!"]));
        let messages = vec![
            Message::text(1, "literal hello").with_content_key("bot.greet.user"),
            Message::text(2, "kept literal").with_content_key("bot.greet.nobody"),
        ];
        let out = Renderer::new(&state, &mut content, "|||").render(&messages);
        assert_eq!(out[0].text, "Welcome back, Ana!");
        assert_eq!(out[1].text, "kept literal");
    }

    #[test]
    fn choices_are_resolved() {
        let state = MemoryStateStore::new().with("task.name", "laundry");
        let mut content = resolver(MemoryContentStore::new().with("user.reply.yes", ["Yep!"]));
        let message = Message::choice(
            7,
            "Done with {task.name}?",
            vec![
                Choice::new("Yes", 8).with_content_key("user.reply.yes"),
                Choice::new("Not {task.name|it}", 9),
            ],
        );
        let out = Renderer::new(&state, &mut content, "|||").render(&[message]);
        assert_eq!(out[0].text, "Done with laundry?");
        assert_eq!(
            out[0].choices,
            vec![
                DisplayChoice {
                    index: 0,
                    text: "Yep!".into()
                },
                DisplayChoice {
                    index: 1,
                    text: "Not laundry".into()
                },
            ]
        );
    }

    #[test]
    fn multi_part_expands_in_order() {
        let state = MemoryStateStore::new();
        let mut content = resolver(MemoryContentStore::new());
        let message = Message::text(12, "A|||B|||C").with_delay(900);
        let out = Renderer::new(&state, &mut content, "|||").render(&[message]);
        let texts: Vec<&str> = out.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
        assert!(out.iter().all(|m| m.id == 12
            && m.message_type == MessageType::Text
            && m.delay == 900));
    }

    #[test]
    fn multi_part_choices_stay_on_last_part() {
        let state = MemoryStateStore::new();
        let mut content = resolver(MemoryContentStore::new());
        let message = Message::choice(3, "Intro ||| Question?", vec![Choice::new("Ok", 4)])
            .with_store_key("q.answer");
        let out = Renderer::new(&state, &mut content, "|||").render(&[message]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Intro");
        assert!(out[0].choices.is_empty());
        assert_eq!(out[1].text, "Question?");
        assert_eq!(out[1].choices.len(), 1);
        assert_eq!(out[1].store_key.as_deref(), Some("q.answer"));
    }

    #[test]
    fn empty_parts_are_dropped() {
        let state = MemoryStateStore::new();
        let mut content = resolver(MemoryContentStore::new());
        let out =
            Renderer::new(&state, &mut content, "|||").render(&[Message::text(1, "A||| |||B|||")]);
        let texts: Vec<&str> = out.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[test]
    fn display_message_serializes_camel_case() {
        let message = DisplayMessage {
            id: 1,
            message_type: MessageType::TextInput,
            text: "Name?".into(),
            delay: 0,
            choices: Vec::new(),
            store_key: Some("user.name".into()),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "textInput");
        assert_eq!(json["storeKey"], "user.name");
        assert!(json.get("choices").is_none());
    }
}
