//! Directory-backed storage: one `<key>.json` file per key.
//!
//! Writes go to a uniquely named temp file in the same directory, are synced,
//! and then renamed over the target, so a reader sees either the old or the
//! new document and never a torn one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use scout_core::ports::StoragePort;
use scout_types::{Result, ScoutError};

const EXTENSION: &str = "json";

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(['/', '\\'])
        {
            return Err(ScoutError::InvalidInput(format!("invalid storage key: '{key}'")));
        }
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    fn write_atomic(&self, path: &Path, value: &[u8]) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ScoutError::InvalidInput(format!("invalid target: {}", path.display())))?;
        let tmp_path = self
            .root
            .join(format!(".{file_name}.tmp.{}", uuid::Uuid::new_v4().simple()));

        {
            let mut tmp = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&tmp_path)
                .map_err(|e| io_error(&tmp_path, e))?;
            tmp.write_all(value).map_err(|e| io_error(&tmp_path, e))?;
            tmp.sync_all().map_err(|e| io_error(&tmp_path, e))?;
        }

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error(path, e));
        }

        if let Ok(dir) = fs::File::open(&self.root) {
            let _ = dir.sync_all();
        }
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ScoutError {
    ScoutError::Persistence(format!("{}: {}", path.display(), e))
}

#[async_trait(?Send)]
impl StoragePort for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        self.write_atomic(&path, value)?;
        log::trace!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}
