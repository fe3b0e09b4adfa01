//! Transcript repository over any key/value `StoragePort`.
//!
//! The whole store lives under one key as a JSON document. Saves are guarded
//! by the document's `version` stamp: a save only goes through when the stored
//! version still equals the version the caller loaded.

use std::rc::Rc;
use async_trait::async_trait;
use scout_types::{Result, ScoutError, session::Store};
use crate::ports::{StoragePort, TranscriptRepository};

pub struct DocumentRepository {
    storage: Rc<dyn StoragePort>,
    key: String,
}

impl DocumentRepository {
    pub fn new(storage: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    async fn stored_version(&self) -> Result<u64> {
        match self.storage.get(&self.key).await? {
            Some(bytes) => Ok(decode(&bytes)?.version),
            None => Ok(0),
        }
    }
}

fn decode(bytes: &[u8]) -> Result<Store> {
    serde_json::from_slice(bytes)
        .map_err(|e| ScoutError::Persistence(format!("corrupt transcript document: {e}")))
}

#[async_trait(?Send)]
impl TranscriptRepository for DocumentRepository {
    async fn load(&self) -> Result<Store> {
        match self.storage.get(&self.key).await? {
            Some(bytes) => {
                let store = decode(&bytes)?;
                log::debug!(
                    "loaded '{}' from {} (version {}, {} sessions)",
                    self.key,
                    self.storage.backend_name(),
                    store.version,
                    store.sessions.len()
                );
                Ok(store)
            }
            None => Ok(Store::default()),
        }
    }

    async fn save(&self, store: &Store) -> Result<u64> {
        let found = self.stored_version().await?;
        if found != store.version {
            return Err(ScoutError::Conflict {
                expected: store.version,
                found,
            });
        }

        let mut next = store.clone();
        next.version = store.version + 1;
        let bytes = serde_json::to_vec_pretty(&next)?;
        self.storage.set(&self.key, &bytes).await?;
        Ok(next.version)
    }
}
