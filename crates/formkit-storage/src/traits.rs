//! Storage traits -- the public API for form persistence.
//!
//! The controller depends on [`FormStore`] rather than on a concrete backend
//! so that alternative stores (in-memory, file, failing mocks) can be
//! substituted.

use formkit_core::FormSchema;

use crate::error::Result;

/// Persistence port for saved forms.
pub trait FormStore: Send {
    /// Every saved form, in save order.
    ///
    /// Never fails: missing, unreadable or corrupt storage reads as empty.
    fn load_all(&self) -> Vec<FormSchema>;

    /// Inserts `schema`, or replaces the saved form with the same id.
    /// Returns the full saved list afterwards.
    fn upsert(&self, schema: &FormSchema) -> Result<Vec<FormSchema>>;

    /// Deletes the saved form `form_id` (a no-op if absent).
    /// Returns the full saved list afterwards.
    fn remove(&self, form_id: &str) -> Result<Vec<FormSchema>>;
}

/// A string-to-string store that the form list is serialized into.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KvBackend + ?Sized> KvBackend for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
