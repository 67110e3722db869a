use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::config::Settings;
use crate::fetch::{BlobStore, StoredObject};

/// Bucket directory on local disk, laid out as `<root>/<bucket>/<storage_path>`
pub struct FilesystemStorage {
    bucket_dir: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl AsRef<Path>, bucket: &str) -> Self {
        Self {
            bucket_dir: root.as_ref().join(bucket),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.storage.root, &settings.storage.bucket)
    }

    fn object_path(&self, storage_path: &str) -> Result<PathBuf> {
        let relative = Path::new(storage_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if storage_path.is_empty() || escapes {
            anyhow::bail!("Invalid storage path: {}", storage_path);
        }

        Ok(self.bucket_dir.join(relative))
    }
}

/// Guess an audio mime type from the file extension
fn mime_from_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "webm" => "audio/webm",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => return None,
    };
    Some(mime.to_string())
}

#[async_trait]
impl BlobStore for FilesystemStorage {
    async fn download(&self, storage_path: &str) -> Result<StoredObject> {
        let path = self.object_path(storage_path)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                anyhow::bail!("Object not found: {}", storage_path)
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        Ok(StoredObject {
            bytes,
            content_type: mime_from_extension(&path),
        })
    }
}
