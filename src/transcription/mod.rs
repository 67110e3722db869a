//! Transcription module for memoscribe
//!
//! Sends downloaded audio to a hosted Whisper-style API.

mod openai_compatible;
mod transcriber;

pub use openai_compatible::OpenAiCompatibleClient;
pub use transcriber::{
    Segment, SpeechToText, Transcriber, TranscriptionRequest, TranscriptionResult,
    VerboseTranscription, AUDIO_FILE_NAME, VERBOSE_RESPONSE_FORMAT,
};

use anyhow::Result;
use std::sync::Arc;

use crate::config::Settings;

/// Build a speech-to-text provider from runtime settings.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn SpeechToText>> {
    Ok(Arc::new(OpenAiCompatibleClient::from_settings(settings)?))
}
