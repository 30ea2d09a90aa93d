//! CLI definitions: argument parsing and subcommands

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const AFTER_HELP: &str = "\
EXAMPLES:
  consultant ask -i \"How do I size a thread pool?\"         Answer with a synthesized expert
  consultant ask -i \"...\" --agent \"Systems engineer\" --refine  Answer as a stored persona, then refine
  consultant ask -i \"...\" --references refs.json --evaluate    Include references and evaluate the answer
  consultant agents                                         List stored personas
  consultant history --clear                                Forget prior exchanges
  consultant usage                                          Per-action token and latency totals
";

/// Command-line arguments for the application
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Ask an expert persona, with key rotation and rate-limit backoff",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a JSON configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity: -v for debug, -vv for trace
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Args {
    /// Log level forced by -v flags, `None` leaves `RUST_LOG` in charge
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ask a question
    Ask(AskArgs),
    /// List stored expert personas
    Agents,
    /// Show or clear chat history
    History {
        /// Delete the history file
        #[arg(long)]
        clear: bool,
    },
    /// Show usage per action
    Usage {
        /// Delete the usage log
        #[arg(long)]
        reset: bool,
    },
    /// List known models and their token ceilings
    Models,
}

#[derive(Debug, clap::Args)]
pub struct AskArgs {
    /// The question
    #[arg(short = 'i', long)]
    pub input: String,

    /// Extra instructions appended to the question
    #[arg(short = 'p', long, default_value = "")]
    pub prompt: String,

    /// Model name, defaults to the configured default model
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Sampling temperature, clamped to [0, 1]
    #[arg(short = 't', long, default_value_t = 0.5)]
    pub temperature: f32,

    /// Answer as this stored persona instead of synthesizing one
    #[arg(short = 'a', long)]
    pub agent: Option<String>,

    /// JSON file with one reference or an array of them
    #[arg(short = 'r', long)]
    pub references: Option<PathBuf>,

    /// Run the refine step
    #[arg(long)]
    pub refine: bool,

    /// Run the evaluate step
    #[arg(long)]
    pub evaluate: bool,
}
