//! Process-local document storage, used when no data directory is usable.
//! Transcripts kept here are gone when the process exits.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use async_trait::async_trait;
use scout_core::ports::StoragePort;
use scout_types::Result;

#[derive(Default)]
pub struct MemoryStorage {
    documents: RefCell<BTreeMap<String, Vec<u8>>>,
    written: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl StoragePort for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.documents.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        if !self.written.replace(true) {
            log::warn!("transcripts are held in memory only and will not outlive this process");
        }
        let previous = self
            .documents
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        log::trace!(
            "document '{}' replaced in memory ({} -> {} bytes)",
            key,
            previous.map_or(0, |p| p.len()),
            value.len()
        );
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
