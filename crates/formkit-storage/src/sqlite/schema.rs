//! Schema for the SQLite backend.

/// Current schema version, recorded under [`SCHEMA_VERSION_KEY`].
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Reserved key in `meta` holding the schema version.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS kv (
        key        TEXT PRIMARY KEY,
        value      TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )",
    "CREATE TABLE IF NOT EXISTS meta (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
];
