use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orator_engine::EngineChoice;

/// Orator speech server
#[derive(Debug, Parser)]
#[command(
    name = "orator",
    version,
    about = "MCP server that reads text aloud through local speech engines"
)]
pub struct Args {
    /// Path to configuration file, built-in defaults when omitted
    #[arg(short, long, env = "ORATOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "ORATOR_LOG", global = true)]
    pub log_filter: String,

    /// Print which speech engines are available and exit
    #[arg(long)]
    pub list_engines: bool,

    /// Serve MCP on stdio when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Speak text once and wait for it to finish
    Speak {
        /// Speed multiplier, 1.0 is normal
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Engine to use: auto, say, swift or espeak
        #[arg(long, default_value = "auto")]
        engine: EngineChoice,

        /// Text to speak; Markdown formatting is removed first
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}
