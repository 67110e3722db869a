//! Repository for transcription records
//!
//! Wraps a [`TranscriptionStore`] with the save and compensation rules of the
//! pipeline's final stage.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::models::{FailureMarker, NewTranscription, TranscriptionRecord};
use crate::storage::TranscriptionStore;
use crate::transcription::TranscriptionResult;
use crate::MemoscribeError;

/// Repository for transcription records
pub struct TranscriptionRepository {
    store: Arc<dyn TranscriptionStore>,
}

impl TranscriptionRepository {
    pub fn new(store: Arc<dyn TranscriptionStore>) -> Self {
        Self { store }
    }

    /// Upsert the transcription for `storage_path`.
    ///
    /// When the upsert fails the error is also written to the record as a
    /// best-effort marker before the failure is returned.
    pub async fn save(
        &self,
        storage_path: &str,
        user_id: &str,
        result: &TranscriptionResult,
    ) -> crate::Result<TranscriptionRecord> {
        let row = NewTranscription::new(storage_path, user_id, result, Utc::now());

        match self.store.upsert(&row).await {
            Ok(record) => {
                info!(
                    "Saved transcription {} for {} ({} segments)",
                    record.id, storage_path, row.metadata.segments_count
                );
                Ok(record)
            }
            Err(e) => {
                let cause = format!("{e:#}");
                self.record_failure(storage_path, user_id, &cause).await;
                Err(MemoscribeError::Persistence(cause))
            }
        }
    }

    /// Write `message` as the error of the latest attempt for `storage_path`.
    ///
    /// Failures of this write are logged and never returned.
    pub async fn record_failure(
        &self,
        storage_path: &str,
        user_id: &str,
        message: &str,
    ) -> Option<TranscriptionRecord> {
        let marker = FailureMarker {
            user_id: user_id.to_string(),
            storage_path: storage_path.to_string(),
            error: message.to_string(),
            processed_at: Utc::now(),
        };

        match self.store.mark_failed(&marker).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Could not record failure for {}: {:#}", storage_path, e);
                None
            }
        }
    }

    /// Get the record for a storage path
    pub async fn find(&self, storage_path: &str) -> Result<Option<TranscriptionRecord>> {
        self.store.find(storage_path).await
    }

    /// List recently processed records
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<TranscriptionRecord>> {
        self.store.list_recent(limit).await
    }
}
