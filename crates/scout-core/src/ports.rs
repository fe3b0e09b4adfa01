//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `scout-core` (pure Rust).
//! Implementations live in `scout-platform` (HTTP and filesystem adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;
use scout_types::{
    Result,
    message::Message,
    search::SearchResult,
    session::Store,
};

// ─── LLM Port ────────────────────────────────────────────────

/// Streaming event from an LLM response
#[derive(Debug, Clone, PartialEq)]
pub enum LlmStreamEvent {
    /// A partial token
    Delta(String),
    /// Stream finished; a stream that stops without `Done` or `Error` is incomplete
    Done,
    /// Error during streaming
    Error(String),
}

/// Request to send to an LLM
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Complete (non-streaming) response from an LLM
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: Message,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait(?Send)]
pub trait LlmPort {
    /// Non-streaming chat completion
    async fn chat_completion(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// Streaming chat completion — returns a stream of events
    fn stream_chat(
        &self,
        req: ChatRequest,
    ) -> Pin<Box<dyn Stream<Item = LlmStreamEvent>>>;

    /// List available models for this provider
    async fn list_models(&self) -> Result<Vec<String>>;
}

// ─── Search Port ─────────────────────────────────────────────

#[async_trait(?Send)]
pub trait SearchPort {
    /// Run one keyword search. Results come back in provider order.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Name of this provider (for logging/debug)
    fn provider_name(&self) -> &str;
}

// ─── Storage Port ────────────────────────────────────────────

/// Whole-document storage: a value is only ever read or replaced entirely.
#[async_trait(?Send)]
pub trait StoragePort {
    /// Read the document stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the document under `key` as a whole
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Transcript Repository ───────────────────────────────────

/// Full-document load and replace of the transcript store.
#[async_trait(?Send)]
pub trait TranscriptRepository {
    /// Load the store, or an empty one if nothing was saved yet
    async fn load(&self) -> Result<Store>;

    /// Replace the stored document. `store.version` must match the stored
    /// version; returns the new version on success.
    async fn save(&self, store: &Store) -> Result<u64>;
}

// ─── Summarizer Port ─────────────────────────────────────────

#[async_trait(?Send)]
pub trait Summarizer {
    /// Fold `messages` into `prior` (if any) and return the new summary
    async fn summarize(&self, prior: Option<&str>, messages: &[Message]) -> Result<String>;
}

// ─── Credential Port ─────────────────────────────────────────

#[async_trait(?Send)]
pub trait CredentialValidator {
    async fn is_valid(&self, key: &str) -> bool;

    /// Human-readable name of the credential ("OpenAI API key", ...)
    fn credential_name(&self) -> &str;
}
