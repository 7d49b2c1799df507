use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mama")]
#[command(author, version, about = "Media-aware static file server")]
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
    /// Serve the configured directory
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Check that external tools used for snapshots are available
    CheckTools,

    /// Print the hash-tagged name a file would be stored under
    Tag {
        /// File to hash
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Print the original name of a hash-tagged file name
    Untag {
        /// Stored file name
        name: String,
    },

    /// Display version information
    Version,
}
