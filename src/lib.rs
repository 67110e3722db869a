//! memoscribe - Voice memo transcription pipeline
//!
//! Downloads an uploaded voice memo from object storage, transcribes it with a
//! speech-to-text API and persists the result keyed by its storage path.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod storage;
pub mod transcription;

use thiserror::Error;

/// Main error type for memoscribe
#[derive(Error, Debug)]
pub enum MemoscribeError {
    #[error("Failed to download audio: {0}")]
    StorageFetch(String),

    #[error("Failed to transcribe audio: {0}")]
    Transcription(String),

    #[error("Failed to save transcription: {0}")]
    Persistence(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MemoscribeError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "memoscribe";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_carry_stage_prefix() {
        let err = MemoscribeError::Transcription("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Failed to transcribe audio: quota exceeded");

        let err = MemoscribeError::StorageFetch("Object not found".to_string());
        assert!(err.to_string().starts_with("Failed to download audio: "));
    }
}
