use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration for content resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentConfig {
    /// RNG seed for variant selection.
    pub seed: u64,
    /// Specific subject -> generic subject, tried after the exact subject.
    pub subject_aliases: BTreeMap<String, String>,
    /// Modifiers tried on the bare `actor.action.subject` key when it has no
    /// content of its own.
    pub default_modifiers: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        let subject_aliases = [
            ("completion", "task"),
            ("streak", "progress"),
            ("reminder", "checkin"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            seed: 42,
            subject_aliases,
            default_modifiers: vec!["positive".to_string(), "neutral".to_string()],
        }
    }
}

impl ContentConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Add or replace a subject alias.
    pub fn with_alias(mut self, subject: impl Into<String>, generic: impl Into<String>) -> Self {
        self.subject_aliases.insert(subject.into(), generic.into());
        self
    }

    /// Replace the default modifier list.
    pub fn with_default_modifiers<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_modifiers = modifiers.into_iter().map(Into::into).collect();
        self
    }

    /// The generic alias of `subject`, if one is configured.
    pub fn alias_for(&self, subject: &str) -> Option<&str> {
        self.subject_aliases
            .get(subject)
            .map(String::as_str)
            .filter(|generic| *generic != subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = ContentConfig::default();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.alias_for("completion"), Some("task"));
        assert_eq!(cfg.default_modifiers, vec!["positive", "neutral"]);
    }

    #[test]
    fn builder_methods() {
        let cfg = ContentConfig::default()
            .with_seed(7)
            .with_alias("workout", "activity")
            .with_default_modifiers(["neutral"]);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.alias_for("workout"), Some("activity"));
        assert_eq!(cfg.default_modifiers, vec!["neutral"]);
    }

    #[test]
    fn self_alias_ignored() {
        let cfg = ContentConfig::default().with_alias("task", "task");
        assert_eq!(cfg.alias_for("task"), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ContentConfig = serde_json::from_str(r#"{"seed": 9}"#).unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.alias_for("streak"), Some("progress"));
    }
}
