use std::path::Path;

use comfy_table::{ContentArrangement, Table};

use cf_engine::walk_from;

pub fn run(dir: &Path, sequence_id: &str, from: Option<u32>) -> Result<(), String> {
    let sequence = super::load_sequence(dir, sequence_id)?;
    let config = cf_engine::FlowConfig::default();
    let start = from
        .or_else(|| sequence.first_message_id())
        .ok_or_else(|| format!("sequence '{sequence_id}' has no messages"))?;

    let result = walk_from(start, &sequence, config.max_walk_depth);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Type", "Text"]);
    for message in &result.messages {
        table.add_row(vec![
            message.id.to_string(),
            message.message_type.to_string(),
            super::preview(&message.text, 60),
        ]);
    }

    println!("{table}");
    println!();
    print!("  Stopped: {}", result.stop_reason);
    if let Some(id) = result.stop_message_id {
        print!(" at {id}");
    }
    if let Some(target) = &result.target_sequence_id {
        print!(" -> sequence '{target}'");
    }
    println!();

    Ok(())
}
