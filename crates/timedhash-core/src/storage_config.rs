//! TOML configuration for timedhash
//!
//! Groups timing, windowing and storage settings. Every table is optional
//! and falls back to its defaults.

use crate::config::{TimingConfig, WindowConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use timedhash_fp::FileKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimedHashConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub windowing: WindowConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Filesystem storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_base_directory")]
    pub base_directory: String,
    #[serde(default)]
    pub format: FileFormat,
    /// zstd-compress binary payloads
    #[serde(default = "default_compress")]
    pub compress: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            format: FileFormat::default(),
            compress: default_compress(),
        }
    }
}

fn default_base_directory() -> String {
    "./segments".to_string()
}
fn default_compress() -> bool {
    true
}

/// File format for filesystem storage
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Binary,
    Json,
    Bson,
    /// Read any known extension, write binary
    #[default]
    Auto,
}

impl FileFormat {
    /// File kind used when writing
    pub fn write_kind(&self) -> FileKind {
        match self {
            FileFormat::Binary | FileFormat::Auto => FileKind::Binary,
            FileFormat::Json => FileKind::Json,
            FileFormat::Bson => FileKind::Bson,
        }
    }

    /// File kinds accepted when reading
    pub fn read_kinds(&self) -> Vec<FileKind> {
        match self {
            FileFormat::Auto => vec![FileKind::Binary, FileKind::Json, FileKind::Bson],
            other => vec![other.write_kind()],
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "th" => Ok(FileFormat::Binary),
            "json" => Ok(FileFormat::Json),
            "bson" => Ok(FileFormat::Bson),
            "auto" => Ok(FileFormat::Auto),
            other => anyhow::bail!("Unknown file format: {}", other),
        }
    }
}

impl TimedHashConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: TimedHashConfig =
            toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.timing.validate()?;
        self.windowing.validate()?;
        if self.storage.base_directory.is_empty() {
            anyhow::bail!("storage.base_directory must not be empty");
        }
        Ok(())
    }
}
