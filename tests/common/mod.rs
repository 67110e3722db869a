#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use memoscribe::fetch::{AudioFetcher, BlobStore, StoredObject};
use memoscribe::pipeline::PipelineCoordinator;
use memoscribe::storage::{Database, SqliteStore, TranscriptionRepository, TranscriptionStore};
use memoscribe::transcription::{
    Segment, SpeechToText, Transcriber, TranscriptionRequest, VerboseTranscription,
};

pub fn run_memoscribe(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
    buckets: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
            buckets: tempfile::tempdir().expect("create temporary bucket root"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("failed to execute memoscribe binary")
    }

    pub fn run_with_api_key(&self, args: &[&str]) -> Output {
        self.command(args)
            .env("GROQ_API_KEY", "test-key")
            .output()
            .expect("failed to execute memoscribe binary")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_memoscribe"));
        cmd.args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("SUPABASE_URL")
            .env_remove("SUPABASE_SERVICE_ROLE_KEY")
            .env_remove("GROQ_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn bucket_root(&self) -> &Path {
        self.buckets.path()
    }

    /// Place an object in the local `voice-memos` bucket.
    pub fn put_object(&self, storage_path: &str, bytes: &[u8]) {
        let path = self.buckets.path().join("voice-memos").join(storage_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create bucket directory");
        }
        std::fs::write(path, bytes).expect("write bucket object");
    }

    /// Point the storage backend at the local bucket directory.
    pub fn use_filesystem_storage(&self) {
        self.write_config(&format!(
            "[storage]\nbackend = \"filesystem\"\nroot = \"{}\"\n",
            self.bucket_root().display()
        ));
    }

    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }
}

/// In-memory bucket
#[derive(Default)]
pub struct FakeBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    pub downloads: AtomicUsize,
}

impl FakeBlobStore {
    pub fn with_object(self, storage_path: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
        self.objects.lock().unwrap().insert(
            storage_path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn download(&self, storage_path: &str) -> Result<StoredObject> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(storage_path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Object not found"))
    }
}

/// Speech-to-text provider with a configurable reply
pub struct FakeSpeechToText {
    reply: Mutex<std::result::Result<VerboseTranscription, String>>,
    pub requests: Mutex<Vec<TranscriptionRequest>>,
}

impl FakeSpeechToText {
    pub fn replying(text: &str, segments: usize) -> Self {
        Self {
            reply: Mutex::new(Ok(verbose(text, segments))),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Mutex::new(Err(message.to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_reply(&self, text: &str, segments: usize) {
        *self.reply.lock().unwrap() = Ok(verbose(text, segments));
    }

    pub fn set_failure(&self, message: &str) {
        *self.reply.lock().unwrap() = Err(message.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechToText for FakeSpeechToText {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<VerboseTranscription> {
        self.requests.lock().unwrap().push(request);
        match &*self.reply.lock().unwrap() {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

pub fn verbose(text: &str, segments: usize) -> VerboseTranscription {
    VerboseTranscription {
        text: text.to_string(),
        language: "en".to_string(),
        duration: 3.2,
        segments: (0..segments)
            .map(|i| Segment {
                start: i as f64 * 0.4,
                end: (i + 1) as f64 * 0.4,
                text: format!("part {i}"),
            })
            .collect(),
    }
}

pub fn sqlite_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new(
        Database::open_in_memory().expect("open in-memory database"),
    ))
}

pub fn coordinator(
    blobs: Arc<FakeBlobStore>,
    provider: Arc<FakeSpeechToText>,
    store: Arc<dyn TranscriptionStore>,
) -> PipelineCoordinator {
    PipelineCoordinator::new(
        AudioFetcher::new(blobs),
        Transcriber::new(provider, "whisper-large-v3".to_string(), "en".to_string()),
        Arc::new(TranscriptionRepository::new(store)),
    )
}
