//! Persistence for saved forms.
//!
//! Saved forms live as one JSON array under a single key. [`FormStore`] is
//! the port the form controller talks to; [`KvFormStore`] implements it on
//! top of any [`KvBackend`] (SQLite, a directory of JSON files, or memory).

pub mod error;
pub mod json_file;
pub mod kv_store;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StorageError};
pub use json_file::JsonFileKv;
pub use kv_store::{DEFAULT_KEY, KvFormStore};
pub use memory::MemoryKv;
pub use sqlite::SqliteKv;
pub use traits::{FormStore, KvBackend};
