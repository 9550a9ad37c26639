//! Configuration management for formkit.
//!
//! This crate handles loading and saving `.formkit/config.yaml` and
//! discovering the `.formkit/` directory a command operates on.

pub mod config;
pub mod formkit_dir;

pub use config::{CONFIG_FILE, ConfigError, FormkitConfig, StorageBackend, StorageConfig, load_config, save_config};
pub use formkit_dir::{FORMKIT_DIR_ENV, FORMKIT_DIR_NAME, ensure_formkit_dir, find_formkit_dir};
