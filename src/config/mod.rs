//! Configuration module for memoscribe
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{
    GeneralSettings, PipelineSettings, Settings, StorageBackend, StorageSettings,
    TranscriptionSettings,
};
