//! Key-value operations for [`SqliteKv`].

use rusqlite::{OptionalExtension, params};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteKv;
use crate::traits::KvBackend;

impl KvBackend for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(StorageError::from_sqlite)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            params![key, value],
        )
        .map_err(StorageError::from_sqlite)?;
        Ok(())
    }
}
