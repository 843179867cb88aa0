pub mod check;
pub mod play;
pub mod walk;

use std::path::Path;

use cf_core::{DirSequenceSource, Sequence, SequenceSource};
use cf_engine::FlowConfig;

/// Load one sequence from `dir`, validated.
fn load_sequence(dir: &Path, id: &str) -> Result<Sequence, String> {
    let source = DirSequenceSource::new(dir);
    let sequence = source
        .load(id)
        .map_err(|e| format!("cannot load '{id}': {e}"))?;
    sequence.validate().map_err(|e| e.to_string())?;
    Ok(sequence)
}

/// Read a `FlowConfig` from JSON, or the defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<FlowConfig, String> {
    let Some(path) = path else {
        return Ok(FlowConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid config {}: {e}", path.display()))
}

/// Shorten `text` for table display.
fn preview(text: &str, width: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > width {
        let cut: String = flat.chars().take(width.saturating_sub(3)).collect();
        format!("{cut}...")
    } else if flat.is_empty() {
        "—".to_string()
    } else {
        flat
    }
}
