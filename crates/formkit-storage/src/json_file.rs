//! [`JsonFileKv`] -- one `<key>.json` file per key inside a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StorageError};
use crate::traits::KvBackend;

/// File-backed key-value store. Writes go to a temporary file that is then
/// renamed over the target, so readers never see a half-written value.
#[derive(Debug, Clone)]
pub struct JsonFileKv {
    dir: PathBuf,
}

impl JsonFileKv {
    /// Uses `dir` for storage. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key(key, "key is empty"));
        }
        if key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(StorageError::invalid_key(key, "key must be a plain file name"));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvBackend for JsonFileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(&path, e))?;
        debug!(path = %path.display(), bytes = value.len(), "wrote key");
        Ok(())
    }
}
