//! memoscribe - Voice memo transcription pipeline
//!
//! Entry point for the memoscribe CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memoscribe::cli::{Cli, Commands};
use memoscribe::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        memoscribe::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let settings = Settings::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_filter(cli.verbose))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Process { storage_path, user } => {
            memoscribe::cli::commands::process_memo(&settings, storage_path, user).await?;
        }
        Commands::Batch { file, concurrency } => {
            memoscribe::cli::commands::process_batch(&settings, &file, concurrency).await?;
        }
        Commands::Download { storage_path } => {
            memoscribe::cli::commands::download_memo(&settings, &storage_path).await?;
        }
        Commands::Show { storage_path, json } => {
            memoscribe::cli::commands::show_transcription(&settings, &storage_path, json).await?;
        }
        Commands::List { limit } => {
            memoscribe::cli::commands::list_transcriptions(&settings, limit).await?;
        }
        Commands::Config(config_cmd) => {
            memoscribe::cli::commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
