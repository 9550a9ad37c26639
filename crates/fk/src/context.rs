//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what a command handler needs: the resolved
//! `.formkit/` directory, the global flags, and the means to open the
//! configured store and a controller over it.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use formkit_config::{ConfigError, FORMKIT_DIR_NAME, FormkitConfig, StorageBackend, find_formkit_dir, load_config};
use formkit_core::FormSchema;
use formkit_session::FormController;
use formkit_storage::{FormStore, JsonFileKv, KvFormStore, MemoryKv, SqliteKv};
use tracing::debug;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Directory passed with `--dir`.
    pub dir_arg: Option<PathBuf>,

    /// `.formkit/` directory, if one was given or found.
    pub formkit_dir: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// `--dir` wins over discovery; it may name the `.formkit/` directory
    /// or its parent. The config's `json` setting turns on JSON output when
    /// the flag is absent.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        let formkit_dir = match global.dir {
            Some(ref dir) if dir.ends_with(FORMKIT_DIR_NAME) => Some(dir.clone()),
            Some(ref dir) => Some(dir.join(FORMKIT_DIR_NAME)),
            None => env::current_dir().ok().and_then(|cwd| find_formkit_dir(&cwd)),
        };
        let config_json = formkit_dir
            .as_deref()
            .and_then(|dir| load_config(dir).ok())
            .is_some_and(|cfg| cfg.json);

        Self {
            dir_arg: global.dir.clone(),
            formkit_dir,
            json: global.json || config_json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// Returns the `.formkit/` directory or an error telling the user to
    /// run `fk init`.
    pub fn require_dir(&self) -> Result<PathBuf> {
        match self.formkit_dir {
            Some(ref dir) if dir.is_dir() => Ok(dir.clone()),
            Some(ref dir) => bail!("{} is not a directory", dir.display()),
            None => Err(ConfigError::FormkitDirNotFound.into()),
        }
    }

    pub fn config(&self) -> Result<FormkitConfig> {
        let dir = self.require_dir()?;
        load_config(&dir).with_context(|| format!("failed to load config from {}", dir.display()))
    }

    /// Opens the store the configuration names.
    pub fn open_store(&self) -> Result<Box<dyn FormStore>> {
        let dir = self.require_dir()?;
        let config = self.config()?;
        let storage = &config.storage;
        let key = storage.key.clone();
        debug!(backend = ?storage.backend, key = %key, "opening store");

        let store: Box<dyn FormStore> = match (storage.backend, storage.location(&dir)) {
            (StorageBackend::Sqlite, Some(path)) => {
                let kv = SqliteKv::open(&path)
                    .with_context(|| format!("failed to open database: {}", path.display()))?;
                Box::new(KvFormStore::with_key(kv, key))
            }
            (StorageBackend::Json, Some(path)) => Box::new(KvFormStore::with_key(JsonFileKv::new(path), key)),
            _ => Box::new(KvFormStore::with_key(MemoryKv::new(), key)),
        };
        Ok(store)
    }

    /// Opens a controller with the saved list loaded.
    pub fn controller(&self) -> Result<FormController> {
        let mut controller = FormController::new(self.open_store()?);
        controller.load_saved();
        Ok(controller)
    }
}

/// Finds a saved form by id, or else by a unique name.
pub fn resolve_form<'a>(forms: &'a [FormSchema], key: &str) -> Result<&'a FormSchema> {
    if let Some(form) = forms.iter().find(|f| f.id == key) {
        return Ok(form);
    }
    let mut by_name = forms.iter().filter(|f| f.name == key);
    match (by_name.next(), by_name.next()) {
        (Some(form), None) => Ok(form),
        (Some(_), Some(_)) => bail!("more than one form is named '{}'; use its id", key),
        (None, _) => bail!("form '{}' not found", key),
    }
}

/// Opens a controller and makes `key` its current form.
pub fn open_form(ctx: &RuntimeContext, key: &str) -> Result<FormController> {
    let mut controller = ctx.controller()?;
    let id = resolve_form(controller.saved_forms(), key)?.id.clone();
    controller.open_saved(&id)?;
    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn forms() -> Vec<FormSchema> {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        vec![
            FormSchema::with_id("form_1", "Signup", at),
            FormSchema::with_id("form_2", "Survey", at),
            FormSchema::with_id("form_3", "Survey", at),
        ]
    }

    #[test]
    fn resolve_by_id_then_name() {
        let forms = forms();
        assert_eq!(resolve_form(&forms, "form_2").unwrap().id, "form_2");
        assert_eq!(resolve_form(&forms, "Signup").unwrap().id, "form_1");
    }

    #[test]
    fn resolve_ambiguous_or_missing() {
        let forms = forms();
        let err = resolve_form(&forms, "Survey").unwrap_err();
        assert!(err.to_string().contains("more than one"));
        assert!(resolve_form(&forms, "Nope").is_err());
    }

    #[test]
    fn missing_dir_is_an_error() {
        let ctx = RuntimeContext {
            dir_arg: None,
            formkit_dir: None,
            json: false,
            verbose: false,
            quiet: false,
        };
        let err = ctx.require_dir().unwrap_err();
        assert!(err.to_string().contains("fk init"));
    }
}
