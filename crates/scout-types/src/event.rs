use serde::{Deserialize, Serialize};

/// Events emitted by the chat runtime.
/// Front ends drain these to render progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// Runtime started processing a user message
    TurnStart { turn_id: u64, session_id: String },

    /// Search finished; `sources` is empty when nothing survived filtering
    SearchComplete { sources: Vec<String> },

    /// Search failed; the turn continues without context
    SearchUnavailable { message: String },

    /// LLM is producing tokens
    LlmDelta { token: String },

    /// LLM finished a complete response
    LlmComplete { text: String },

    /// Older messages were folded into the session summary
    SessionCompacted { session_id: String, summarized_through: usize },

    /// Runtime finished the current turn
    TurnEnd { turn_id: u64 },

    /// An error occurred
    Error { message: String },
}
