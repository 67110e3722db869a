//! Data models for storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transcription::{Segment, TranscriptionResult};

/// Number of segments kept in record metadata
pub const STORED_SEGMENT_LIMIT: usize = 5;

/// Summary of the provider response stored alongside the text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Audio duration in seconds
    pub duration: f64,

    /// Total number of segments returned by the provider
    pub segments_count: usize,

    /// Leading segments, at most [`STORED_SEGMENT_LIMIT`]
    pub segments: Vec<Segment>,
}

impl RecordMetadata {
    pub fn from_result(result: &TranscriptionResult) -> Self {
        Self {
            duration: result.duration,
            segments_count: result.segments.len(),
            segments: result
                .segments
                .iter()
                .take(STORED_SEGMENT_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

/// A persisted transcription, one per storage path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    /// Unique identifier (UUID), kept across reprocessing
    pub id: String,

    pub user_id: String,

    /// Upsert key
    pub storage_path: String,

    /// Absent when no attempt has succeeded yet
    pub transcription_text: Option<String>,

    pub language: Option<String>,

    /// When the most recent attempt finished
    pub processed_at: DateTime<Utc>,

    pub metadata: Option<RecordMetadata>,

    /// Failure message of the most recent attempt
    pub error: Option<String>,
}

/// Row written by a successful save
#[derive(Debug, Clone)]
pub struct NewTranscription {
    pub user_id: String,
    pub storage_path: String,
    pub transcription_text: String,
    pub language: String,
    pub processed_at: DateTime<Utc>,
    pub metadata: RecordMetadata,
}

impl NewTranscription {
    pub fn new(
        storage_path: &str,
        user_id: &str,
        result: &TranscriptionResult,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            storage_path: storage_path.to_string(),
            transcription_text: result.text.clone(),
            language: result.language.clone(),
            processed_at,
            metadata: RecordMetadata::from_result(result),
        }
    }
}

/// Error marker written when an attempt fails after download
#[derive(Debug, Clone)]
pub struct FailureMarker {
    pub user_id: String,
    pub storage_path: String,
    pub error: String,
    pub processed_at: DateTime<Utc>,
}
