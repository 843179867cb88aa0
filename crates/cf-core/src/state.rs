//! Persisted user state: a flat, dot-namespaced key-value store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::value::StateValue;

/// Read/write access to persisted user state.
///
/// Keys are flat strings; dots are a naming convention (`user.name`), not
/// nesting.
pub trait StateStore {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> Option<StateValue>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: StateValue) -> CoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> CoreResult<()>;

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<String>;
}

impl<T: StateStore + ?Sized> StateStore for Box<T> {
    fn get(&self, key: &str) -> Option<StateValue> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: StateValue) -> CoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}

fn check_key(key: &str) -> CoreResult<()> {
    if key.trim().is_empty() {
        Err(CoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// In-memory state, one instance per session or test.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    values: BTreeMap<String, StateValue>,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for seeding tests and fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<StateValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StateValue) -> CoreResult<()> {
        check_key(key)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// State persisted as a flat JSON object, written through on every change.
#[derive(Debug)]
pub struct JsonFileStateStore {
    path: PathBuf,
    values: BTreeMap<String, StateValue>,
}

impl JsonFileStateStore {
    /// Open the store at `path`. A missing file starts an empty store.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| CoreError::Io {
                path: path.clone(),
                source,
            })?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "opened state file");
        Ok(Self { path, values })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Put `key` back the way it was after a failed write.
    fn restore(&mut self, key: &str, previous: Option<StateValue>) {
        match previous {
            Some(value) => self.values.insert(key.to_string(), value),
            None => self.values.remove(key),
        };
    }

    fn flush(&self) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json).map_err(|source| CoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl StateStore for JsonFileStateStore {
    fn get(&self, key: &str) -> Option<StateValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StateValue) -> CoreResult<()> {
        check_key(key)?;
        let previous = self.values.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            self.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        let Some(previous) = self.values.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.restore(key, Some(previous));
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}
