use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoutError {
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Session already exists: {0}")]
    DuplicateSessionName(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Store was modified concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl ScoutError {
    /// Errors raised by the durable store, after which the mutation is pending
    pub fn is_persistence(&self) -> bool {
        matches!(self, ScoutError::Persistence(_) | ScoutError::Conflict { .. })
    }
}

impl From<serde_json::Error> for ScoutError {
    fn from(e: serde_json::Error) -> Self {
        ScoutError::Serialization(e.to_string())
    }
}
