use std::fmt;

use crate::config::ContentConfig;

/// A parsed `actor.action.subject.modifier*` content key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticKey {
    /// Who speaks, e.g. `bot`.
    pub actor: String,
    /// What is done, e.g. `acknowledge`.
    pub action: String,
    /// What it is about, e.g. `completion`.
    pub subject: String,
    /// Most general first; the last modifier is the most specific.
    pub modifiers: Vec<String>,
}

impl SemanticKey {
    /// Parse a key. Fewer than three segments, or any empty segment, is
    /// malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.trim().split('.').collect();
        if parts.len() < 3 || parts.iter().any(|p| p.trim().is_empty()) {
            return None;
        }
        Some(Self {
            actor: parts[0].to_string(),
            action: parts[1].to_string(),
            subject: parts[2].to_string(),
            modifiers: parts[3..].iter().map(|p| (*p).to_string()).collect(),
        })
    }

    fn base(&self, subject: &str) -> String {
        format!("{}.{}.{}", self.actor, self.action, subject)
    }

    /// Keys for one subject: full modifier tail, then dropping modifiers from
    /// the end, then the bare base, then the base with each default modifier.
    fn chain_for_subject(&self, subject: &str, default_modifiers: &[String], out: &mut Vec<String>) {
        let base = self.base(subject);
        for len in (1..=self.modifiers.len()).rev() {
            out.push(format!("{base}.{}", self.modifiers[..len].join(".")));
        }
        out.push(base.clone());
        for modifier in default_modifiers {
            out.push(format!("{base}.{modifier}"));
        }
    }

    /// The ordered, de-duplicated fallback chain for this key.
    pub fn fallback_chain(&self, config: &ContentConfig) -> Vec<String> {
        let mut chain = Vec::new();
        self.chain_for_subject(&self.subject, &config.default_modifiers, &mut chain);
        if let Some(generic) = config.alias_for(&self.subject) {
            self.chain_for_subject(generic, &config.default_modifiers, &mut chain);
        }

        let mut seen = std::collections::HashSet::new();
        chain.retain(|k| seen.insert(k.clone()));
        chain
    }
}

impl fmt::Display for SemanticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base(&self.subject))?;
        for modifier in &self.modifiers {
            write!(f, ".{modifier}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_defaults() -> ContentConfig {
        ContentConfig::default().with_default_modifiers(Vec::<String>::new())
    }

    #[test]
    fn parse_variable_arity() {
        let key = SemanticKey::parse("bot.acknowledge.completion.celebratory.first_time").unwrap();
        assert_eq!(key.actor, "bot");
        assert_eq!(key.action, "acknowledge");
        assert_eq!(key.subject, "completion");
        assert_eq!(key.modifiers, vec!["celebratory", "first_time"]);
        assert_eq!(key.to_string(), "bot.acknowledge.completion.celebratory.first_time");

        let bare = SemanticKey::parse("bot.greet.user").unwrap();
        assert!(bare.modifiers.is_empty());
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(SemanticKey::parse("").is_none());
        assert!(SemanticKey::parse("bot").is_none());
        assert!(SemanticKey::parse("bot.greet").is_none());
        assert!(SemanticKey::parse("bot..user").is_none());
        assert!(SemanticKey::parse("bot.greet.user.").is_none());
    }

    #[test]
    fn chain_drops_modifiers_most_specific_first() {
        let key = SemanticKey::parse("bot.ask.mood.gentle.evening").unwrap();
        assert_eq!(
            key.fallback_chain(&no_defaults()),
            vec![
                "bot.ask.mood.gentle.evening",
                "bot.ask.mood.gentle",
                "bot.ask.mood",
            ]
        );
    }

    #[test]
    fn chain_repeats_for_generic_alias() {
        let key = SemanticKey::parse("bot.acknowledge.completion.warm").unwrap();
        assert_eq!(
            key.fallback_chain(&no_defaults()),
            vec![
                "bot.acknowledge.completion.warm",
                "bot.acknowledge.completion",
                "bot.acknowledge.task.warm",
                "bot.acknowledge.task",
            ]
        );
    }

    #[test]
    fn chain_appends_default_modifiers_after_base() {
        let config = ContentConfig::default().with_default_modifiers(["positive"]);
        let key = SemanticKey::parse("bot.acknowledge.completion.celebratory").unwrap();
        assert_eq!(
            key.fallback_chain(&config),
            vec![
                "bot.acknowledge.completion.celebratory",
                "bot.acknowledge.completion",
                "bot.acknowledge.completion.positive",
                "bot.acknowledge.task.celebratory",
                "bot.acknowledge.task",
                "bot.acknowledge.task.positive",
            ]
        );
    }

    #[test]
    fn chain_has_no_duplicates() {
        let config = ContentConfig::default().with_default_modifiers(["positive"]);
        let key = SemanticKey::parse("bot.cheer.user.positive").unwrap();
        let chain = key.fallback_chain(&config);
        assert_eq!(chain, vec!["bot.cheer.user.positive", "bot.cheer.user"]);
    }
}
