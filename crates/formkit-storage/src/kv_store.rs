//! [`KvFormStore`] -- the saved-form list kept as JSON under one key.

use formkit_core::FormSchema;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::{FormStore, KvBackend};

/// Key the saved-form list is stored under unless configured otherwise.
pub const DEFAULT_KEY: &str = "dynamic-form-builder-forms";

/// [`FormStore`] that serializes the whole saved list into one backend key.
#[derive(Debug)]
pub struct KvFormStore<B> {
    backend: B,
    key: String,
}

impl<B: KvBackend> KvFormStore<B> {
    /// Creates a store using [`DEFAULT_KEY`].
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads the saved list, propagating backend failures.
    ///
    /// Unparsable content reads as an empty list. Individual entries that do
    /// not decode as a form are skipped so one bad entry does not hide the
    /// rest.
    fn read(&self) -> Result<Vec<FormSchema>> {
        let Some(text) = self.backend.get(&self.key)? else {
            return Ok(Vec::new());
        };
        let entries: Vec<serde_json::Value> = match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key = %self.key, error = %e, "saved forms are corrupt, treating as empty");
                return Ok(Vec::new());
            }
        };
        let forms = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value::<FormSchema>(entry) {
                Ok(form) => Some(form),
                Err(e) => {
                    warn!(key = %self.key, index = i, error = %e, "skipping unreadable saved form");
                    None
                }
            })
            .collect();
        Ok(forms)
    }

    fn write(&self, forms: &[FormSchema]) -> Result<()> {
        let text = serde_json::to_string(forms)?;
        self.backend.set(&self.key, &text)
    }
}

impl<B: KvBackend> FormStore for KvFormStore<B> {
    fn load_all(&self) -> Vec<FormSchema> {
        match self.read() {
            Ok(forms) => {
                debug!(count = forms.len(), "loaded saved forms");
                forms
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read saved forms");
                Vec::new()
            }
        }
    }

    fn upsert(&self, schema: &FormSchema) -> Result<Vec<FormSchema>> {
        let mut forms = self.read()?;
        match forms.iter_mut().find(|f| f.id == schema.id) {
            Some(existing) => *existing = schema.clone(),
            None => forms.push(schema.clone()),
        }
        self.write(&forms)?;
        info!(form = %schema.id, name = %schema.name, "saved form");
        Ok(forms)
    }

    fn remove(&self, form_id: &str) -> Result<Vec<FormSchema>> {
        let mut forms = self.read()?;
        let before = forms.len();
        forms.retain(|f| f.id != form_id);
        if forms.len() == before {
            debug!(form = form_id, "form to delete was not saved");
        }
        self.write(&forms)?;
        info!(form = form_id, "deleted saved form");
        Ok(forms)
    }
}
