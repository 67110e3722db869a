//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// memoscribe - Voice memo download, transcription and storage
#[derive(Parser, Debug)]
#[command(name = "memoscribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download, transcribe and save one voice memo
    Process {
        /// Storage path of the uploaded memo
        storage_path: String,

        /// Owner of the memo
        #[arg(short, long)]
        user: String,
    },

    /// Process jobs from a JSON-lines file of {"storage_path", "user_id"}
    Batch {
        /// Jobs file, or "-" for stdin
        file: PathBuf,

        /// Maximum number of jobs in flight (defaults to pipeline.max_concurrent_jobs)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Download a memo and print it as base64 JSON
    Download {
        /// Storage path of the uploaded memo
        storage_path: String,
    },

    /// Show the stored transcription for a memo
    Show {
        /// Storage path of the memo
        storage_path: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recently processed memos
    List {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
