//! File-backed store
//!
//! One JSON file per key under a data directory. The default directory is
//! the platform data dir for the application.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::warn;

use super::{ProgressStore, StoreError};

/// Key-value store persisting each key as `<dir>/<key>.json`
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at an explicit directory (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform data directory
    pub fn open_default() -> Result<Self, StoreError> {
        let proj_dirs = ProjectDirs::from("", "", "shinpo").ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(proj_dirs.data_dir()))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Directory this store writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ProgressStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(err) => {
                warn!("Failed to read {:?}: {err}", path);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_path(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.write("progress", "{\"a\":1}").unwrap();
        assert_eq!(store.read("progress").as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn read_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read("nothing").is_none());
    }

    #[test]
    fn write_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep/data");
        let store = FileStore::new(&nested);

        store.write("k", "v").unwrap();
        assert!(nested.join("k.json").exists());
    }
}
