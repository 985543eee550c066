use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tonearm")]
#[command(author, version, about = "Personal music streaming server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the music folder and start the streaming server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scan the music folder and print a summary
    Scan,

    /// Probe audio files and display extracted metadata
    Probe {
        /// Files to probe
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Check that the configured external tools are available
    CheckTools,
}
