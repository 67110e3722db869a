//! Audio download stage
//!
//! Reads uploaded voice memos from a storage bucket.

mod filesystem;
mod payload;
mod supabase;

pub use filesystem::FilesystemStorage;
pub use payload::{AudioPayload, EncodedAudio, FALLBACK_MIME_TYPE};
pub use supabase::SupabaseStorage;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Settings, StorageBackend};
use crate::MemoscribeError;

/// An object read from a bucket
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Blob storage addressed by storage path
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, storage_path: &str) -> Result<StoredObject>;
}

/// Build the configured blob store.
pub fn build_store(settings: &Settings) -> Result<Arc<dyn BlobStore>> {
    match settings.storage.backend {
        StorageBackend::Supabase => Ok(Arc::new(SupabaseStorage::from_settings(settings)?)),
        StorageBackend::Filesystem => Ok(Arc::new(FilesystemStorage::from_settings(settings))),
    }
}

/// Downloads audio for the transcription stage
pub struct AudioFetcher {
    store: Arc<dyn BlobStore>,
}

impl AudioFetcher {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Fetch the blob at `storage_path`
    pub async fn fetch(&self, storage_path: &str) -> crate::Result<AudioPayload> {
        tracing::debug!("Downloading audio: {}", storage_path);

        let object = self
            .store
            .download(storage_path)
            .await
            .map_err(|e| MemoscribeError::StorageFetch(format!("{e:#}")))?;

        tracing::debug!(
            "Downloaded {} bytes ({:?}) for {}",
            object.bytes.len(),
            object.content_type,
            storage_path
        );

        Ok(AudioPayload::new(
            storage_path.to_string(),
            object.bytes,
            object.content_type,
        ))
    }
}
