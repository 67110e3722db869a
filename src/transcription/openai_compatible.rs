//! Client for OpenAI-compatible `/audio/transcriptions` endpoints (Groq, OpenAI).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Settings;
use crate::transcription::transcriber::{
    SpeechToText, TranscriptionRequest, VerboseTranscription,
};

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";
const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

pub struct OpenAiCompatibleClient {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiCompatibleClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = settings.transcription.provider.to_lowercase();
        let default_endpoint = match provider.as_str() {
            "groq" => GROQ_ENDPOINT,
            "openai" => OPENAI_ENDPOINT,
            other => anyhow::bail!(
                "Unsupported transcription.provider '{}'. Supported providers: groq, openai",
                other
            ),
        };

        let api_key = settings.transcription.api_key.trim().to_string();
        if api_key.is_empty() {
            anyhow::bail!(
                "Transcription API key is missing. Set transcription.api_key in config or GROQ_API_KEY."
            );
        }

        let endpoint = if settings.transcription.endpoint.trim().is_empty() {
            default_endpoint.to_string()
        } else {
            settings
                .transcription
                .endpoint
                .trim()
                .trim_end_matches('/')
                .to_string()
        };

        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(
                    settings.transcription.timeout_secs,
                ))
                .build()
                .context("Failed to build transcription HTTP client")?,
            api_key,
            endpoint,
        })
    }

    fn request_url(&self) -> String {
        format!("{}/audio/transcriptions", self.endpoint)
    }
}

#[async_trait]
impl SpeechToText for OpenAiCompatibleClient {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<VerboseTranscription> {
        let file = Part::bytes(request.audio)
            .file_name(request.file_name)
            .mime_str(&request.mime_type)
            .with_context(|| format!("Invalid mime type: {}", request.mime_type))?;

        let form = Form::new()
            .part("file", file)
            .text("model", request.model)
            .text("response_format", request.response_format)
            .text("language", request.language)
            .text("timestamp_granularities[]", "segment");

        let response = self
            .http
            .post(self.request_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("{}", api_error_message(status, &body));
        }

        response
            .json::<VerboseTranscription>()
            .await
            .context("Failed to parse transcription response")
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Prefer the provider's own `error.message` over the raw body.
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.trim().is_empty() => {
            envelope.error.message.trim().to_string()
        }
        _ => format!("API error ({status}): {}", body.trim()),
    }
}
