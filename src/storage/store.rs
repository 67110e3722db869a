//! Persistence seam used by the repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::storage::models::{FailureMarker, NewTranscription, TranscriptionRecord};
use crate::storage::Database;

/// Transcription table keyed by storage path
#[async_trait]
pub trait TranscriptionStore: Send + Sync {
    /// Insert or overwrite the record for `row.storage_path`
    async fn upsert(&self, row: &NewTranscription) -> Result<TranscriptionRecord>;

    /// Record a failure against `marker.storage_path`
    async fn mark_failed(&self, marker: &FailureMarker) -> Result<TranscriptionRecord>;

    async fn find(&self, storage_path: &str) -> Result<Option<TranscriptionRecord>>;

    async fn list_recent(&self, limit: usize) -> Result<Vec<TranscriptionRecord>>;
}

/// SQLite-backed store shared by concurrent jobs.
///
/// Queries run on the blocking pool so database writes never stall the
/// async workers driving other jobs.
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| anyhow::anyhow!("Database lock poisoned"))?;
            f(&db)
        })
        .await
        .context("Database task failed")?
    }
}

#[async_trait]
impl TranscriptionStore for SqliteStore {
    async fn upsert(&self, row: &NewTranscription) -> Result<TranscriptionRecord> {
        let row = row.clone();
        self.with_db(move |db| db.upsert_transcription(&row)).await
    }

    async fn mark_failed(&self, marker: &FailureMarker) -> Result<TranscriptionRecord> {
        let marker = marker.clone();
        self.with_db(move |db| db.mark_failed(&marker)).await
    }

    async fn find(&self, storage_path: &str) -> Result<Option<TranscriptionRecord>> {
        let storage_path = storage_path.to_string();
        self.with_db(move |db| db.get_transcription(&storage_path)).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<TranscriptionRecord>> {
        self.with_db(move |db| db.list_transcriptions(limit)).await
    }
}
