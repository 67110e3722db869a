//! Audio payloads passed from the download stage to the transcription stage

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Mime type assumed when storage does not report one
pub const FALLBACK_MIME_TYPE: &str = "audio/webm";

/// Raw audio downloaded for one storage path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub storage_path: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioPayload {
    /// Build a payload, falling back to `audio/webm` for a missing or blank mime type
    pub fn new(storage_path: String, bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        let mime_type = mime_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

        Self {
            storage_path,
            bytes,
            mime_type,
        }
    }

    /// Text-safe form for crossing a textual boundary
    pub fn encode(&self) -> EncodedAudio {
        EncodedAudio {
            storage_path: self.storage_path.clone(),
            audio_base64: STANDARD.encode(&self.bytes),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Base64 transport form of [`AudioPayload`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAudio {
    pub storage_path: String,
    pub audio_base64: String,
    pub mime_type: String,
}

impl EncodedAudio {
    /// Reassemble the original bytes and mime type
    pub fn decode(&self) -> Result<AudioPayload> {
        let bytes = STANDARD
            .decode(self.audio_base64.as_bytes())
            .with_context(|| format!("Invalid base64 audio for {}", self.storage_path))?;

        Ok(AudioPayload::new(
            self.storage_path.clone(),
            bytes,
            Some(self.mime_type.clone()),
        ))
    }
}
