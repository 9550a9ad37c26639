//! SQLite key-value backend.

pub mod kv;
pub mod schema;
pub mod store;

pub use store::SqliteKv;
