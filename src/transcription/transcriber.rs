//! Speech-to-text stage

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Settings;
use crate::fetch::AudioPayload;
use crate::MemoscribeError;

/// File name the audio is uploaded under
pub const AUDIO_FILE_NAME: &str = "audio.webm";

/// Response format requesting per-segment timestamps
pub const VERBOSE_RESPONSE_FORMAT: &str = "verbose_json";

/// One timed span of transcribed speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    pub text: String,
}

/// Upload handed to a speech-to-text provider
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub file_name: String,
    pub mime_type: String,
    pub audio: Vec<u8>,
    pub model: String,
    pub language: String,
    pub response_format: String,
}

/// Verbose provider response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerboseTranscription {
    pub text: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<VerboseTranscription>;
}

/// Normalized output of the transcription stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub storage_path: String,
    pub text: String,
    pub language: String,
    /// Audio duration in seconds
    pub duration: f64,
    pub segments: Vec<Segment>,
}

/// Turns downloaded audio into a [`TranscriptionResult`]
pub struct Transcriber {
    provider: Arc<dyn SpeechToText>,
    model: String,
    language: String,
}

impl Transcriber {
    pub fn new(provider: Arc<dyn SpeechToText>, model: String, language: String) -> Self {
        Self {
            provider,
            model,
            language,
        }
    }

    pub fn from_settings(settings: &Settings, provider: Arc<dyn SpeechToText>) -> Self {
        Self::new(
            provider,
            settings.transcription.model.clone(),
            settings.transcription.language.clone(),
        )
    }

    /// Transcribe one payload. Provider failures are not retried.
    pub async fn transcribe(&self, payload: AudioPayload) -> crate::Result<TranscriptionResult> {
        let AudioPayload {
            storage_path,
            bytes,
            mime_type,
        } = payload;

        tracing::debug!(
            "Transcribing {} ({} bytes, {}) with {}",
            storage_path,
            bytes.len(),
            mime_type,
            self.model
        );

        let request = TranscriptionRequest {
            file_name: AUDIO_FILE_NAME.to_string(),
            mime_type,
            audio: bytes,
            model: self.model.clone(),
            language: self.language.clone(),
            response_format: VERBOSE_RESPONSE_FORMAT.to_string(),
        };

        let response = self
            .provider
            .transcribe(request)
            .await
            .map_err(|e| MemoscribeError::Transcription(format!("{e:#}")))?;

        Ok(TranscriptionResult {
            storage_path,
            text: response.text,
            language: response.language,
            duration: response.duration,
            segments: response.segments,
        })
    }
}
