use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use cf_core::DirSequenceSource;

pub fn run(dir: &Path) -> Result<(), String> {
    let source = DirSequenceSource::new(dir);
    let ids = source.list().map_err(|e| e.to_string())?;
    if ids.is_empty() {
        println!("  No sequences found in {}.", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Sequence", "Name", "Messages", "Issues"]);

    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for id in &ids {
        match super::load_sequence(dir, id) {
            Ok(sequence) => {
                let issues = sequence.lint();
                table.add_row(vec![
                    sequence.id.clone(),
                    sequence.name.clone(),
                    sequence.messages.len().to_string(),
                    issues.len().to_string(),
                ]);
                warnings.extend(issues.into_iter().map(|issue| (id.clone(), issue)));
            }
            Err(e) => {
                table.add_row(vec![id.clone(), "—".into(), "—".into(), "error".into()]);
                failures.push(e);
            }
        }
    }

    println!("{table}");
    for (id, issue) in &warnings {
        println!("  {} {id}: {issue}", "warning".yellow().bold());
    }
    for failure in &failures {
        println!("  {} {failure}", "error".red().bold());
    }

    if failures.is_empty() {
        println!(
            "  {} {} sequences, {} warnings",
            "ok".green().bold(),
            ids.len(),
            warnings.len()
        );
        Ok(())
    } else {
        Err(format!("{} of {} sequences failed to load", failures.len(), ids.len()))
    }
}
