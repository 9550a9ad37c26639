//! Configuration types and loading.
//!
//! The main entry point is [`FormkitConfig`], the contents of
//! `.formkit/config.yaml`. Every field has a default, so a partial or empty
//! file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the configuration inside `.formkit/`.
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// The `.formkit/` directory was not found.
    #[error("no .formkit directory found (run 'fk init' first)")]
    FormkitDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Storage section
// ---------------------------------------------------------------------------

/// Where saved forms are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A SQLite database (`forms.db`).
    #[default]
    Sqlite,
    /// A directory with one JSON file per key.
    Json,
    /// Nothing is persisted between runs.
    Memory,
}

/// `storage:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Overrides the backend's default location. Relative paths are taken
    /// from the `.formkit/` directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Key the saved-form list is stored under.
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            key: default_key(),
        }
    }
}

fn default_key() -> String {
    formkit_storage::DEFAULT_KEY.to_string()
}

impl StorageConfig {
    /// Resolved location of the store for `formkit_dir`, or `None` for the
    /// memory backend.
    pub fn location(&self, formkit_dir: &Path) -> Option<PathBuf> {
        let default = match self.backend {
            StorageBackend::Sqlite => "forms.db",
            StorageBackend::Json => "store",
            StorageBackend::Memory => return None,
        };
        let path = self.path.as_deref().unwrap_or(Path::new(default));
        Some(formkit_dir.join(path))
    }
}

// ---------------------------------------------------------------------------
// FormkitConfig
// ---------------------------------------------------------------------------

/// Contents of `.formkit/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormkitConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    /// Emit JSON output by default.
    #[serde(default)]
    pub json: bool,
}

impl FormkitConfig {
    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "storage.key".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from `config.yaml` inside the given `.formkit/`
/// directory.
///
/// A missing or empty file yields the default configuration.
pub fn load_config(formkit_dir: &Path) -> Result<FormkitConfig> {
    let config_path = formkit_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(FormkitConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)?;
    if content.trim().is_empty() {
        return Ok(FormkitConfig::default());
    }

    let config: FormkitConfig = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to `config.yaml` inside the given `.formkit/`
/// directory, creating the directory if needed.
pub fn save_config(formkit_dir: &Path, config: &FormkitConfig) -> Result<()> {
    config.validate()?;
    std::fs::create_dir_all(formkit_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(formkit_dir.join(CONFIG_FILE), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
