//! File-backed record store: one `<id>.rec` JSON file per record.

use crate::storage::RecordStore;
use crate::{Error, Record, Result};
use std::fs;
use std::path::{Path, PathBuf};

const RECORD_EXT: &str = "rec";

/// Record store over a flat directory of JSON files.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<FileStore> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    /// The directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORD_EXT))
    }
}

impl RecordStore for FileStore {
    fn save(&self, record: &Record) -> Result<()> {
        let id = record.id.as_deref().ok_or(Error::UnnamedRecord)?;
        let data = serde_json::to_vec(record)?;
        fs::write(self.record_path(id), data)?;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Record> {
        let data = fs::read(self.record_path(id))
            .map_err(|_| Error::RecordNotFound(id.to_string()))?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn delete(&self, id: &str) -> Result<()> {
        fs::remove_file(self.record_path(id))
            .map_err(|_| Error::RecordNotFound(id.to_string()))?;
        Ok(())
    }

    fn contains(&self, id: &str) -> bool {
        self.record_path(id).exists()
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == RECORD_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }
}
