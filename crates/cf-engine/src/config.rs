//! Configuration for a flow engine.

use cf_content::ContentConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a flow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    /// Maximum steps in one walk before it is treated as a loop.
    pub max_walk_depth: usize,
    /// Maximum walk/route cycles in one `process_from` call.
    pub max_cycles: usize,
    /// Splits one authored text into several display messages.
    pub part_delimiter: String,
    /// State key holding the user's active weekdays.
    pub active_days_key: String,
    /// ISO weekdays (1 = Monday) used when the state holds none.
    pub default_active_days: Vec<u32>,
    /// Content resolution settings.
    pub content: ContentConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_walk_depth: 50,
            max_cycles: 25,
            part_delimiter: "|||".to_string(),
            active_days_key: "user.activeDays".to_string(),
            default_active_days: (1..=7).collect(),
            content: ContentConfig::default(),
        }
    }
}

impl FlowConfig {
    /// Set the walk depth bound (at least 1).
    pub fn with_max_walk_depth(mut self, depth: usize) -> Self {
        self.max_walk_depth = depth.max(1);
        self
    }

    /// Set the cycle bound (at least 1).
    pub fn with_max_cycles(mut self, cycles: usize) -> Self {
        self.max_cycles = cycles.max(1);
        self
    }

    /// Set the multi-part delimiter.
    pub fn with_part_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.part_delimiter = delimiter.into();
        self
    }

    /// Set the state key holding active weekdays.
    pub fn with_active_days_key(mut self, key: impl Into<String>) -> Self {
        self.active_days_key = key.into();
        self
    }

    /// Set the fallback active weekdays; out-of-range days are dropped.
    pub fn with_default_active_days(mut self, days: impl IntoIterator<Item = u32>) -> Self {
        self.default_active_days = days.into_iter().filter(|d| (1..=7).contains(d)).collect();
        self
    }

    /// Set the content resolution settings.
    pub fn with_content(mut self, content: ContentConfig) -> Self {
        self.content = content;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = FlowConfig::default();
        assert_eq!(cfg.max_walk_depth, 50);
        assert_eq!(cfg.max_cycles, 25);
        assert_eq!(cfg.part_delimiter, "|||");
        assert_eq!(cfg.active_days_key, "user.activeDays");
        assert_eq!(cfg.default_active_days, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn builder_methods() {
        let cfg = FlowConfig::default()
            .with_max_walk_depth(10)
            .with_max_cycles(3)
            .with_part_delimiter("~~")
            .with_default_active_days([1, 3, 9]);
        assert_eq!(cfg.max_walk_depth, 10);
        assert_eq!(cfg.max_cycles, 3);
        assert_eq!(cfg.part_delimiter, "~~");
        assert_eq!(cfg.default_active_days, vec![1, 3]);
    }

    #[test]
    fn bounds_clamped() {
        let cfg = FlowConfig::default().with_max_walk_depth(0).with_max_cycles(0);
        assert_eq!(cfg.max_walk_depth, 1);
        assert_eq!(cfg.max_cycles, 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: FlowConfig =
            serde_json::from_str(r#"{"maxCycles": 5, "content": {"seed": 1}}"#).unwrap();
        assert_eq!(cfg.max_cycles, 5);
        assert_eq!(cfg.max_walk_depth, 50);
        assert_eq!(cfg.content.seed, 1);
    }
}
