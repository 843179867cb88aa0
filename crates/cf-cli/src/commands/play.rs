use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use cf_content::{ContentStore, DirContentStore, MemoryContentStore};
use cf_core::{
    DirSequenceSource, JsonFileStateStore, MemoryStateStore, MessageLookup, MessageType,
    StateStore,
};
use cf_engine::{ChatSession, DisplayMessage, FlowEngine, FlowResult, UserResponse};

pub fn run(
    dir: &Path,
    sequence: &str,
    content: Option<&Path>,
    state: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), String> {
    let config = super::load_config(config)?;

    let state: Box<dyn StateStore> = match state {
        Some(path) => Box::new(JsonFileStateStore::open(path).map_err(|e| e.to_string())?),
        None => Box::new(MemoryStateStore::new()),
    };
    let content: Box<dyn ContentStore> = match content {
        Some(path) => Box::new(DirContentStore::new(path)),
        None => Box::new(MemoryContentStore::new()),
    };

    let engine = FlowEngine::new(config, DirSequenceSource::new(dir), state, content);
    let mut session = ChatSession::new(engine);

    let mut result = session.start(sequence).map_err(|e| e.to_string())?;
    print_messages(&result.messages);
    println!("  Type 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    while let Some(waiting) = session.awaiting() {
        let kind = session
            .engine()
            .sequences()
            .get_message(waiting)
            .map(|m| m.message_type);

        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()), // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let response = match kind {
            Some(MessageType::Choice) => match input.parse::<usize>() {
                Ok(n) if n >= 1 => UserResponse::Choice(n - 1),
                _ => {
                    println!("{}\n", "Pick a choice by its number.".yellow());
                    continue;
                }
            },
            _ => UserResponse::Text(input.to_string()),
        };

        match session.submit_user_response(waiting, response) {
            Ok(next) => {
                print_messages(&next.messages);
                result = next;
            }
            Err(e) => println!("{}\n", e.to_string().yellow()),
        }
    }

    print_outcome(&result);
    Ok(())
}

fn print_messages(messages: &[DisplayMessage]) {
    for message in messages {
        match message.message_type {
            MessageType::System => println!("  {}", message.text.dimmed()),
            _ => println!("  {}", message.text),
        }
        for choice in &message.choices {
            println!("    {}) {}", choice.index + 1, choice.text);
        }
    }
    println!();
}

fn print_outcome(result: &FlowResult) {
    if result.complete {
        println!("  {}", "Conversation complete.".green());
    } else if result.is_truncated() {
        println!("  {}", "Conversation stopped early: too many routing cycles.".yellow());
    }
}
