//! Storage module for memoscribe
//!
//! Persists transcription records in SQLite, one row per storage path.

mod database;
mod models;
mod repository;
mod store;

pub use database::Database;
pub use models::{
    FailureMarker, NewTranscription, RecordMetadata, TranscriptionRecord, STORED_SEGMENT_LIMIT,
};
pub use repository::TranscriptionRepository;
pub use store::{SqliteStore, TranscriptionStore};
