//! CLI frontend for the chatflow conversation engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chatflow",
    about = "Run and inspect scripted conversation flows",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every sequence in a directory and report problems
    Check {
        /// Directory containing sequence .json files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print the raw walk of a sequence without routing or rendering
    Walk {
        /// Sequence id (file name without .json)
        sequence: String,

        /// Message id to start from (default: first message)
        #[arg(short, long)]
        from: Option<u32>,

        /// Directory containing sequence .json files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Play a sequence interactively
    Play {
        /// Sequence id to start with
        sequence: String,

        /// Directory containing sequence .json files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Directory of semantic content files
        #[arg(short, long)]
        content: Option<PathBuf>,

        /// JSON file persisting user state between runs
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// JSON engine configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { dir } => commands::check::run(&dir),
        Commands::Walk {
            sequence,
            from,
            dir,
        } => commands::walk::run(&dir, &sequence, from),
        Commands::Play {
            sequence,
            dir,
            content,
            state,
            config,
        } => commands::play::run(
            &dir,
            &sequence,
            content.as_deref(),
            state.as_deref(),
            config.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
