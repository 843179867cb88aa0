use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Read-only access to authored text variants, keyed by a reduced semantic key.
pub trait ContentStore {
    /// Variants for exactly this key, or `None` when nothing usable exists.
    fn load_variants(&self, key: &str) -> Option<Vec<String>>;
}

impl<T: ContentStore + ?Sized> ContentStore for Box<T> {
    fn load_variants(&self, key: &str) -> Option<Vec<String>> {
        (**self).load_variants(key)
    }
}

/// Variants registered in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    entries: HashMap<String, Vec<String>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register variants for a key.
    pub fn insert<I, S>(&mut self, key: impl Into<String>, variants: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(key.into(), variants.into_iter().map(Into::into).collect());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<I, S>(mut self, key: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, variants);
        self
    }
}

impl ContentStore for MemoryContentStore {
    fn load_variants(&self, key: &str) -> Option<Vec<String>> {
        self.entries
            .get(key)
            .map(|v| usable(v.clone()))
            .filter(|v| !v.is_empty())
    }
}

fn usable(variants: Vec<String>) -> Vec<String> {
    variants
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VariantFile {
    List(Vec<String>),
    Object { variants: Vec<String> },
}

/// Variants stored on disk: key `a.b.c.d` lives at `<root>/a/b/c/d.json`.
///
/// A file holds either a JSON array of strings or `{"variants": [...]}`.
#[derive(Debug, Clone)]
pub struct DirContentStore {
    root: PathBuf,
}

impl DirContentStore {
    /// Read content below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The file a key maps to, or `None` for keys that cannot name a file.
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = key.split('.').collect();
        let bad = |s: &&str| s.is_empty() || s.contains(['/', '\\']);
        if segments.iter().any(bad) {
            return None;
        }
        let (last, dirs) = segments.split_last()?;
        let mut path = self.root.clone();
        for dir in dirs {
            path.push(dir);
        }
        path.push(format!("{last}.json"));
        Some(path)
    }
}

impl ContentStore for DirContentStore {
    fn load_variants(&self, key: &str) -> Option<Vec<String>> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return None;
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable content file");
                return None;
            }
        };
        let variants = match serde_json::from_str::<VariantFile>(&raw) {
            Ok(VariantFile::List(v)) | Ok(VariantFile::Object { variants: v }) => usable(v),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "malformed content file");
                return None;
            }
        };
        if variants.is_empty() {
            None
        } else {
            Some(variants)
        }
    }
}
