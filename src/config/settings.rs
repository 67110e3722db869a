//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Object storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionSettings,

    /// Job execution settings
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for the database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where voice memos are read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Supabase Storage over HTTP
    #[default]
    Supabase,
    /// A directory on local disk laid out as `<root>/<bucket>/<path>`
    Filesystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Storage backend (supabase, filesystem)
    #[serde(default)]
    pub backend: StorageBackend,

    /// Project URL (supabase backend)
    #[serde(default)]
    pub url: String,

    /// Service role key (supabase backend)
    #[serde(default)]
    pub service_key: String,

    /// Bucket holding the uploaded memos
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Root directory (filesystem backend)
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Provider preset (groq, openai)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API endpoint (empty = provider default)
    #[serde(default)]
    pub endpoint: String,

    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Target language (ISO-639-1)
    #[serde(default = "default_language")]
    pub language: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Upper bound on jobs processed at the same time by `batch`
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "memoscribe", "memoscribe")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/memoscribe"))
}

fn default_storage_root() -> PathBuf {
    let mut dir = default_data_dir();
    dir.push("buckets");
    dir
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bucket() -> String {
    "voice-memos".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_concurrent_jobs() -> usize {
    4
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: String::new(),
            service_key: String::new(),
            bucket: default_bucket(),
            root: default_storage_root(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: String::new(),
            api_key: String::new(),
            model: default_model(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::load_from(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse a settings file without applying environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides to empty credentials.
    fn apply_env_overrides(&mut self) {
        fill_from_env(&mut self.storage.url, "SUPABASE_URL");
        fill_from_env(&mut self.storage.service_key, "SUPABASE_SERVICE_ROLE_KEY");
        fill_from_env(&mut self.transcription.api_key, "GROQ_API_KEY");
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "memoscribe", "memoscribe")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the database path
    pub fn database_path(&self) -> PathBuf {
        self.general.data_dir.join("memoscribe.db")
    }

    /// Default tracing filter when `RUST_LOG` is unset
    pub fn log_filter(&self, verbose: bool) -> &str {
        if verbose {
            "debug"
        } else {
            self.general.log_level.as_str()
        }
    }
}

fn fill_from_env(field: &mut String, var: &str) {
    if field.trim().is_empty() {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                *field = value;
            }
        }
    }
}
