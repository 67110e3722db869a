//! Voice memo pipeline
//!
//! Sequences download, transcription and persistence for each job.

mod coordinator;
mod job;

pub use coordinator::PipelineCoordinator;
pub use job::{JobOutcome, JobState, VoiceMemoJob};

use anyhow::Result;
use std::sync::Arc;

use crate::config::Settings;
use crate::fetch::{build_store, AudioFetcher};
use crate::storage::{Database, SqliteStore, TranscriptionRepository};
use crate::transcription::{build_provider, Transcriber};

/// Wire the pipeline from runtime settings.
pub fn build_coordinator(settings: &Settings) -> Result<PipelineCoordinator> {
    let fetcher = AudioFetcher::new(build_store(settings)?);
    let transcriber = Transcriber::from_settings(settings, build_provider(settings)?);
    let repository = open_repository(settings)?;

    Ok(PipelineCoordinator::new(
        fetcher,
        transcriber,
        Arc::new(repository),
    ))
}

/// Open the record repository backed by the configured database.
pub fn open_repository(settings: &Settings) -> Result<TranscriptionRepository> {
    let db = Database::open(settings)?;
    Ok(TranscriptionRepository::new(Arc::new(SqliteStore::new(db))))
}
