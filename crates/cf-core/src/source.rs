//! Sources that load authored sequences by id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::sequence::Sequence;

/// Loads sequences by id.
pub trait SequenceSource {
    /// Load the sequence with this id.
    fn load(&self, id: &str) -> CoreResult<Sequence>;
}

/// Sequences registered in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySequenceSource {
    sequences: HashMap<String, Sequence>,
}

impl MemorySequenceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sequence, replacing one with the same id.
    pub fn insert(&mut self, sequence: Sequence) {
        self.sequences.insert(sequence.id.clone(), sequence);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, sequence: Sequence) -> Self {
        self.insert(sequence);
        self
    }
}

impl SequenceSource for MemorySequenceSource {
    fn load(&self, id: &str) -> CoreResult<Sequence> {
        self.sequences
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::SequenceNotFound(id.to_string()))
    }
}

/// Sequences stored as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DirSequenceSource {
    dir: PathBuf,
}

impl DirSequenceSource {
    /// Read sequences from `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory sequences are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids of every `.json` file in the directory, sorted.
    pub fn list(&self) -> CoreResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| CoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl SequenceSource for DirSequenceSource {
    fn load(&self, id: &str) -> CoreResult<Sequence> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(CoreError::SequenceNotFound(id.to_string()));
        }
        let path = self.dir.join(format!("{id}.json"));
        if !path.is_file() {
            return Err(CoreError::SequenceNotFound(id.to_string()));
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| CoreError::Io {
            path: path.clone(),
            source,
        })?;
        let sequence: Sequence = serde_json::from_str(&raw)?;
        if sequence.id != id {
            tracing::debug!(
                file = %path.display(),
                declared = %sequence.id,
                "sequence id differs from file name"
            );
        }
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn memory_source_loads_registered() {
        let source = MemorySequenceSource::new()
            .with(Sequence::new("intro").with_message(Message::text(1, "Hello")));
        assert_eq!(source.load("intro").unwrap().messages.len(), 1);
        assert!(matches!(
            source.load("missing"),
            Err(CoreError::SequenceNotFound(_))
        ));
    }

    #[test]
    fn dir_source_reads_json_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("intro.json"),
            r#"{
                "id": "intro",
                "name": "Intro",
                "messages": [
                    {"id": 1, "type": "text", "text": "Hello"},
                    {"id": 2, "type": "choice", "text": "Ready?",
                     "choices": [{"text": "Yes", "nextMessageId": 3}]}
                ]
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = DirSequenceSource::new(dir.path());
        assert_eq!(source.list().unwrap(), vec!["intro".to_string()]);

        let seq = source.load("intro").unwrap();
        assert_eq!(seq.name, "Intro");
        assert_eq!(seq.messages[1].choices.len(), 1);
    }

    #[test]
    fn dir_source_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "[1, 2").unwrap();
        let source = DirSequenceSource::new(dir.path());

        assert!(matches!(source.load("bad"), Err(CoreError::Json(_))));
        assert!(matches!(
            source.load("absent"),
            Err(CoreError::SequenceNotFound(_))
        ));
        assert!(matches!(
            source.load("../escape"),
            Err(CoreError::SequenceNotFound(_))
        ));
    }
}
