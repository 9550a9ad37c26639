//! Discovery and creation of the `.formkit/` directory.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// The name of the formkit metadata directory.
pub const FORMKIT_DIR_NAME: &str = ".formkit";

/// Environment variable that overrides discovery.
pub const FORMKIT_DIR_ENV: &str = "FORMKIT_DIR";

/// Walk up the directory tree from `start` looking for a `.formkit/`
/// directory. `FORMKIT_DIR` is checked first.
pub fn find_formkit_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(FORMKIT_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }
    find_formkit_dir_from(start)
}

fn find_formkit_dir_from(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(FORMKIT_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Ensure a `.formkit/` directory exists at `path` (or under it, if `path`
/// is not itself named `.formkit`). Returns the directory.
pub fn ensure_formkit_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if path.ends_with(FORMKIT_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(FORMKIT_DIR_NAME)
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let formkit = dir.path().join(FORMKIT_DIR_NAME);
        std::fs::create_dir(&formkit).unwrap();

        let found = find_formkit_dir_from(dir.path()).unwrap();
        assert_eq!(found.canonicalize().unwrap(), formkit.canonicalize().unwrap());
    }

    #[test]
    fn test_find_from_child() {
        let dir = tempfile::tempdir().unwrap();
        let formkit = dir.path().join(FORMKIT_DIR_NAME);
        std::fs::create_dir(&formkit).unwrap();
        let child = dir.path().join("a").join("b");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_formkit_dir_from(&child).unwrap();
        assert_eq!(found.canonicalize().unwrap(), formkit.canonicalize().unwrap());
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(find_formkit_dir_from(&missing).is_none());
    }

    #[test]
    fn test_ensure_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let created = ensure_formkit_dir(dir.path()).unwrap();
        assert!(created.is_dir());
        assert!(created.ends_with(FORMKIT_DIR_NAME));
        assert_eq!(ensure_formkit_dir(&created).unwrap(), created);
    }
}
