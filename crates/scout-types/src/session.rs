use serde::{Deserialize, Serialize};
use crate::message::Message;

/// A named, independently persisted conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    /// Running summary of the messages folded away by compaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Number of leading messages already covered by `summary`
    #[serde(default)]
    pub summarized_through: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            messages: Vec::new(),
            summary: None,
            summarized_through: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// A session seeded with the operating instructions at position 0
    pub fn seeded(id: impl Into<String>, system_prompt: &str) -> Self {
        let mut session = Self::new(id);
        session.messages.push(Message::system(system_prompt));
        session
    }

    /// The seed system message, if the session has one
    pub fn seed(&self) -> Option<&Message> {
        self.messages.first().filter(|m| m.is_system())
    }

    /// Messages after the seed
    pub fn conversation(&self) -> &[Message] {
        let start = usize::from(self.seed().is_some());
        &self.messages[start..]
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    pub fn listing(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            updated_at: self.updated_at.clone(),
            message_count: self.conversation().len(),
            compacted: self.summary.is_some(),
        }
    }
}

/// Summary of a session for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub updated_at: String,
    pub message_count: usize,
    pub compacted: bool,
}

/// How a caller picks a session.
/// `Index` exists for front ends that address sessions by list position;
/// prefer `Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSelector {
    Id(String),
    Index(usize),
}

impl From<&str> for SessionSelector {
    fn from(id: &str) -> Self {
        SessionSelector::Id(id.to_string())
    }
}

impl From<usize> for SessionSelector {
    fn from(index: usize) -> Self {
        SessionSelector::Index(index)
    }
}

/// The whole transcript document, persisted as one unit.
/// Sessions keep creation order; renames re-key in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Optimistic-concurrency stamp, bumped on every successful save
    #[serde(default)]
    pub version: u64,
    #[serde(default = "first_session_number")]
    pub next_session_number: u64,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

fn first_session_number() -> u64 {
    1
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: 0,
            next_session_number: first_session_number(),
            sessions: Vec::new(),
        }
    }
}

impl Store {
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn select(&self, selector: &SessionSelector) -> Option<&Session> {
        match selector {
            SessionSelector::Id(id) => self.get(id),
            SessionSelector::Index(index) => self.sessions.get(*index),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.id.clone()).collect()
    }
}
