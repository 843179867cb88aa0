use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ContentConfig;
use crate::key::SemanticKey;
use crate::store::ContentStore;

/// Resolves semantic keys to authored text through a fallback chain.
///
/// Successful resolutions are cached per exact input key until
/// [`clear_cache`](Self::clear_cache), so repeated calls return the same line.
pub struct ContentResolver {
    store: Box<dyn ContentStore>,
    config: ContentConfig,
    cache: HashMap<String, String>,
    rng: StdRng,
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl ContentResolver {
    /// Create a resolver over a content store.
    pub fn new<S: ContentStore + 'static>(store: S, config: ContentConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            store: Box::new(store),
            config,
            cache: HashMap::new(),
            rng,
        }
    }

    /// The active content configuration.
    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Resolve `key`, returning `fallback` unchanged when nothing resolves or
    /// the key is malformed.
    pub fn resolve(&mut self, key: &str, fallback: &str) -> String {
        self.try_resolve(key)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Resolve `key`, or `None` when no level of the chain has content.
    pub fn try_resolve(&mut self, key: &str) -> Option<String> {
        if let Some(hit) = self.cache.get(key) {
            return Some(hit.clone());
        }

        let Some(parsed) = SemanticKey::parse(key) else {
            tracing::debug!(key, "malformed content key");
            return None;
        };

        for candidate in parsed.fallback_chain(&self.config) {
            let Some(variants) = self.store.load_variants(&candidate) else {
                continue;
            };
            if variants.is_empty() {
                continue;
            }
            let line = variants[self.rng.random_range(0..variants.len())].clone();
            tracing::debug!(key, resolved = %candidate, "content resolved");
            self.cache.insert(key.to_string(), line.clone());
            return Some(line);
        }

        tracing::debug!(key, "no content for key");
        None
    }

    /// The fallback chain that would be tried for `key`; empty when malformed.
    pub fn resolve_chain(&self, key: &str) -> Vec<String> {
        SemanticKey::parse(key)
            .map(|k| k.fallback_chain(&self.config))
            .unwrap_or_default()
    }

    /// Drop every cached resolution.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached resolutions.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
