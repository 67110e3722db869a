use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::Settings;
use crate::fetch::{BlobStore, StoredObject};

/// Supabase Storage bucket read with the service role key
pub struct SupabaseStorage {
    http: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.storage.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            anyhow::bail!(
                "Storage URL is missing. Set storage.url in config or SUPABASE_URL."
            );
        }

        let service_key = settings.storage.service_key.trim().to_string();
        if service_key.is_empty() {
            anyhow::bail!(
                "Storage service key is missing. Set storage.service_key in config or SUPABASE_SERVICE_ROLE_KEY."
            );
        }

        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(settings.storage.timeout_secs))
                .build()
                .context("Failed to build storage HTTP client")?,
            base_url,
            service_key,
            bucket: settings.storage.bucket.clone(),
        })
    }

    fn object_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            storage_path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn download(&self, storage_path: &str) -> Result<StoredObject> {
        let response = self
            .http
            .get(self.object_url(storage_path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .context("Storage request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Storage error ({status}) for {storage_path}: {body}");
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .context("Failed to read storage response body")?;

        Ok(StoredObject {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
