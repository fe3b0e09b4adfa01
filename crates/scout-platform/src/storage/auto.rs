//! Pick the storage backend named in the config.
//!
//! `Auto` tries the file backend first and falls back to memory when the
//! data directory cannot be created.

use std::rc::Rc;
use scout_core::ports::StoragePort;
use scout_types::{
    Result,
    config::{StorageBackendType, StoreConfig},
};
use super::{FileStorage, MemoryStorage};

/// Returns a trait object so callers are backend-agnostic.
pub fn open_storage(config: &StoreConfig) -> Result<Rc<dyn StoragePort>> {
    match config.backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory");
            Ok(Rc::new(MemoryStorage::new()))
        }
        StorageBackendType::File => {
            let storage = FileStorage::open(&config.data_dir)?;
            log::info!("Storage backend: file ({})", storage.root().display());
            Ok(Rc::new(storage))
        }
        StorageBackendType::Auto => match FileStorage::open(&config.data_dir) {
            Ok(storage) => {
                log::info!("Storage backend: file ({})", storage.root().display());
                Ok(Rc::new(storage))
            }
            Err(e) => {
                log::warn!("file storage unavailable ({}), falling back to memory", e);
                Ok(Rc::new(MemoryStorage::new()))
            }
        },
    }
}
