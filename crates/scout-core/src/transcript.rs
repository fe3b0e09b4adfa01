//! Session-keyed transcript store.
//!
//! Every mutation is applied to a copy of the last persisted store, written
//! through the repository, and only then becomes the current state. A write
//! that fails twice leaves the current state untouched and parks the copy as
//! *pending* so the caller can retry it later.

use std::rc::Rc;
use scout_types::{
    Result, ScoutError,
    config::ScoutConfig,
    message::Message,
    session::{Session, SessionSelector, SessionSummary, Store},
};
use crate::compaction::{self, Compactor};
use crate::ports::TranscriptRepository;

/// Label prefixed to names derived from a first user message
pub const DERIVED_NAME_LABEL: &str = "Chat: ";
/// Characters of the first user message kept in a derived name
pub const DERIVED_NAME_CHARS: usize = 30;

/// The session-level effect of a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Created(String),
    Renamed { from: String, to: String },
    Updated(String),
    Deleted(String),
}

struct Pending {
    store: Store,
    change: SessionChange,
}

pub struct TranscriptStore {
    repo: Rc<dyn TranscriptRepository>,
    system_prompt: String,
    seed_system_prompt: bool,
    compactor: Option<Compactor>,
    persisted: Store,
    pending: Option<Pending>,
}

impl TranscriptStore {
    /// Load the store through `repo`.
    pub async fn open(repo: Rc<dyn TranscriptRepository>, config: &ScoutConfig) -> Result<Self> {
        let persisted = repo.load().await?;
        log::info!(
            "transcript store opened: {} sessions (version {})",
            persisted.sessions.len(),
            persisted.version
        );
        Ok(Self {
            repo,
            system_prompt: config.system_prompt.clone(),
            seed_system_prompt: config.store.seed_system_prompt,
            compactor: None,
            persisted,
            pending: None,
        })
    }

    /// Compact sessions as a side effect of `append_message`.
    pub fn with_compaction(mut self, compactor: Compactor) -> Self {
        self.compactor = Some(compactor);
        self
    }

    /// Last successfully persisted state.
    pub fn snapshot(&self) -> &Store {
        &self.persisted
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.persisted.sessions.iter().map(Session::listing).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.persisted.contains(id)
    }

    /// Read-only copy of one session.
    pub fn select_session(&self, selector: impl Into<SessionSelector>) -> Result<Session> {
        let selector = selector.into();
        self.persisted
            .select(&selector)
            .cloned()
            .ok_or_else(|| ScoutError::SessionNotFound(describe(&selector)))
    }

    /// Messages to send to the model for this session.
    pub fn prompt_messages(&self, id: &str) -> Result<Vec<Message>> {
        let session = self.session(id)?;
        Ok(compaction::prompt_messages(session))
    }

    /// Create a session. Without a name, the next free "Session N" is used.
    pub async fn create_session(&mut self, name: Option<&str>) -> Result<String> {
        let mut next = self.persisted.clone();
        let id = match name {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ScoutError::InvalidInput(
                        "session name cannot be empty".to_string(),
                    ));
                }
                if next.contains(name) {
                    return Err(ScoutError::DuplicateSessionName(name.to_string()));
                }
                name.to_string()
            }
            None => loop {
                let candidate = format!("Session {}", next.next_session_number);
                next.next_session_number += 1;
                if !next.contains(&candidate) {
                    break candidate;
                }
            },
        };

        next.sessions.push(self.fresh_session(&id));
        self.commit(next, SessionChange::Created(id.clone())).await?;
        log::info!("created session '{}'", id);
        Ok(id)
    }

    /// Create a session named after the first user message.
    pub async fn create_session_from_message(&mut self, text: &str) -> Result<String> {
        let base = derive_session_name(text);
        let mut id = base.clone();
        let mut n = 2;
        while self.persisted.contains(&id) {
            id = format!("{base} ({n})");
            n += 1;
        }
        self.create_session(Some(&id)).await
    }

    /// Re-key a session in place; messages, summary and position are kept.
    pub async fn rename_session(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        let new_id = new_id.trim();
        if new_id.is_empty() {
            return Err(ScoutError::InvalidInput(
                "session name cannot be empty".to_string(),
            ));
        }
        self.session(old_id)?;
        if old_id == new_id {
            return Ok(());
        }
        if self.persisted.contains(new_id) {
            return Err(ScoutError::DuplicateSessionName(new_id.to_string()));
        }

        let mut next = self.persisted.clone();
        let session = Self::session_mut(&mut next, old_id)?;
        session.id = new_id.to_string();
        session.touch();
        let change = SessionChange::Renamed {
            from: old_id.to_string(),
            to: new_id.to_string(),
        };
        self.commit(next, change).await?;
        log::info!("renamed session '{}' to '{}'", old_id, new_id);
        Ok(())
    }

    /// Append one message, compacting the session afterwards if configured.
    ///
    /// A system message is only accepted as the first message of an empty
    /// session.
    pub async fn append_message(&mut self, id: &str, message: Message) -> Result<()> {
        let mut next = self.persisted.clone();
        let session = Self::session_mut(&mut next, id)?;
        if message.is_system() && !session.messages.is_empty() {
            return Err(ScoutError::InvalidInput(format!(
                "session '{id}' already has messages; system messages are only allowed at position 0"
            )));
        }
        session.messages.push(message);
        session.touch();

        if let Some(compactor) = &self.compactor {
            match compactor.compact(session).await {
                Ok(compacted) => *session = compacted,
                Err(e) => log::warn!(
                    "compaction of session '{}' failed, keeping full history: {}",
                    id,
                    e
                ),
            }
        }

        self.commit(next, SessionChange::Updated(id.to_string())).await
    }

    /// Run compaction explicitly. Returns whether the summary changed.
    pub async fn compact_session(&mut self, id: &str) -> Result<bool> {
        let Some(compactor) = &self.compactor else {
            return Ok(false);
        };
        let current = self.session(id)?;
        let compacted = compactor.compact(current).await?;
        if &compacted == current {
            return Ok(false);
        }

        let mut next = self.persisted.clone();
        *Self::session_mut(&mut next, id)? = compacted;
        self.commit(next, SessionChange::Updated(id.to_string())).await?;
        Ok(true)
    }

    /// Reset a session to empty, or to a fresh seed when seeding is on.
    pub async fn clear_session(&mut self, id: &str) -> Result<()> {
        let mut next = self.persisted.clone();
        let fresh = self.fresh_session(id);
        let session = Self::session_mut(&mut next, id)?;
        session.messages = fresh.messages;
        session.summary = None;
        session.summarized_through = 0;
        session.touch();
        self.commit(next, SessionChange::Updated(id.to_string())).await?;
        log::info!("cleared session '{}'", id);
        Ok(())
    }

    pub async fn delete_session(&mut self, id: &str) -> Result<()> {
        let mut next = self.persisted.clone();
        let pos = next
            .position(id)
            .ok_or_else(|| ScoutError::SessionNotFound(id.to_string()))?;
        next.sessions.remove(pos);
        self.commit(next, SessionChange::Deleted(id.to_string())).await?;
        log::info!("deleted session '{}'", id);
        Ok(())
    }

    /// Re-read the store, dropping any pending mutation.
    pub async fn reload(&mut self) -> Result<()> {
        self.persisted = self.repo.load().await?;
        self.pending = None;
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Try again to write the mutation that last failed to persist.
    ///
    /// Returns what the write committed, so callers holding a session id can
    /// follow a rename or deletion. `None` when nothing was pending.
    pub async fn retry_pending(&mut self) -> Result<Option<SessionChange>> {
        let Some(Pending { store, change }) = self.pending.take() else {
            return Ok(None);
        };
        self.commit(store, change.clone()).await?;
        Ok(Some(change))
    }

    pub fn discard_pending(&mut self) {
        if self.pending.take().is_some() {
            log::warn!("discarded a pending transcript mutation");
        }
    }

    fn fresh_session(&self, id: &str) -> Session {
        if self.seed_system_prompt {
            Session::seeded(id, &self.system_prompt)
        } else {
            Session::new(id)
        }
    }

    fn session(&self, id: &str) -> Result<&Session> {
        self.persisted
            .get(id)
            .ok_or_else(|| ScoutError::SessionNotFound(id.to_string()))
    }

    fn session_mut<'a>(store: &'a mut Store, id: &str) -> Result<&'a mut Session> {
        store
            .get_mut(id)
            .ok_or_else(|| ScoutError::SessionNotFound(id.to_string()))
    }

    /// Persist `next`, retrying once. On success it becomes the current state;
    /// on failure it is parked as pending and the current state is unchanged.
    async fn commit(&mut self, mut next: Store, change: SessionChange) -> Result<()> {
        let saved = match self.repo.save(&next).await {
            Ok(version) => Ok(version),
            Err(e) => {
                log::warn!("transcript save failed, retrying once: {}", e);
                self.repo.save(&next).await
            }
        };

        match saved {
            Ok(version) => {
                if self.pending.take().is_some() {
                    log::warn!("a newer mutation replaced the pending one");
                }
                next.version = version;
                self.persisted = next;
                Ok(())
            }
            Err(e) => {
                log::error!("transcript save failed, mutation kept pending: {}", e);
                self.pending = Some(Pending { store: next, change });
                Err(match e {
                    e @ (ScoutError::Persistence(_) | ScoutError::Conflict { .. }) => e,
                    other => ScoutError::Persistence(other.to_string()),
                })
            }
        }
    }
}

/// Session name derived from the first user message.
pub fn derive_session_name(first_message: &str) -> String {
    let head: String = first_message
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(DERIVED_NAME_CHARS)
        .collect();
    let head = head.trim_end();
    if head.is_empty() {
        format!("{DERIVED_NAME_LABEL}untitled")
    } else {
        format!("{DERIVED_NAME_LABEL}{head}")
    }
}

fn describe(selector: &SessionSelector) -> String {
    match selector {
        SessionSelector::Id(id) => id.clone(),
        SessionSelector::Index(index) => format!("#{index}"),
    }
}
