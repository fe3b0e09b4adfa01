//! Length-triggered compaction of a session into a running summary.
//!
//! Raw messages are never removed. Compaction only advances
//! `Session::summarized_through` and rewrites `Session::summary`, and
//! `prompt_messages` decides what actually goes to the model.

use std::ops::Range;
use std::rc::Rc;
use async_trait::async_trait;
use scout_types::{
    Result, ScoutError,
    config::CompactionConfig,
    message::{Message, Role},
    session::Session,
};
use crate::ports::{ChatRequest, LlmPort, Summarizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    pub threshold: usize,
    pub keep_recent: usize,
}

impl From<&CompactionConfig> for CompactionPolicy {
    fn from(config: &CompactionConfig) -> Self {
        Self {
            threshold: config.threshold,
            keep_recent: config.keep_recent,
        }
    }
}

impl CompactionPolicy {
    /// Messages that should be folded into the summary next, if any.
    ///
    /// Nothing is due until the conversation (seed excluded) is longer than
    /// `threshold`, and the last `keep_recent` messages always stay raw.
    pub fn due_range(&self, session: &Session) -> Option<Range<usize>> {
        let start = usize::from(session.seed().is_some());
        if session.messages.len() - start <= self.threshold {
            return None;
        }
        let from = session.summarized_through.max(start);
        let to = session.messages.len().saturating_sub(self.keep_recent);
        (to > from).then_some(from..to)
    }
}

pub struct Compactor {
    policy: CompactionPolicy,
    summarizer: Rc<dyn Summarizer>,
}

impl Compactor {
    pub fn new(policy: CompactionPolicy, summarizer: Rc<dyn Summarizer>) -> Self {
        Self { policy, summarizer }
    }

    /// Fold any due messages into the summary.
    ///
    /// Returns the session unchanged when nothing is due, so calling it twice
    /// in a row makes at most one summarizer call.
    pub async fn compact(&self, session: &Session) -> Result<Session> {
        let Some(range) = self.policy.due_range(session) else {
            return Ok(session.clone());
        };

        let summary = self
            .summarizer
            .summarize(session.summary.as_deref(), &session.messages[range.clone()])
            .await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(ScoutError::Llm("summarizer returned an empty summary".to_string()));
        }

        let mut compacted = session.clone();
        compacted.summary = Some(summary.to_string());
        compacted.summarized_through = range.end;
        log::info!(
            "compacted session '{}': {} messages folded, {} kept raw",
            session.id,
            range.len(),
            session.messages.len() - range.end
        );
        Ok(compacted)
    }
}

/// Messages to send to the model for `session`.
///
/// Without a summary this is the full history. With one it is the seed, a
/// system note carrying the summary, and every message not yet summarized.
pub fn prompt_messages(session: &Session) -> Vec<Message> {
    let Some(summary) = session.summary.as_deref() else {
        return session.messages.clone();
    };

    let start = usize::from(session.seed().is_some());
    let tail_from = session.summarized_through.clamp(start, session.messages.len());

    let mut messages = Vec::with_capacity(session.messages.len() - tail_from + 2);
    if let Some(seed) = session.seed() {
        messages.push(seed.clone());
    }
    messages.push(Message::system(format!(
        "Summary of the earlier conversation:\n{summary}"
    )));
    messages.extend_from_slice(&session.messages[tail_from..]);
    messages
}

const SUMMARIZER_INSTRUCTIONS: &str = "You maintain a running summary of a conversation between a user and an assistant. \
Merge the previous summary (if any) with the new messages into one concise summary. \
Keep facts, figures, named entities and open questions. Reply with the summary only.";

/// Summarizer backed by a chat-completion call.
pub struct LlmSummarizer {
    llm: Rc<dyn LlmPort>,
    model: String,
    max_tokens: u32,
}

impl LlmSummarizer {
    pub fn new(llm: Rc<dyn LlmPort>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            llm,
            model: model.into(),
            max_tokens,
        }
    }

    fn build_request(&self, prior: Option<&str>, messages: &[Message]) -> ChatRequest {
        let mut body = String::new();
        if let Some(prior) = prior {
            body.push_str("Previous summary:\n");
            body.push_str(prior);
            body.push_str("\n\n");
        }
        body.push_str("New messages:\n");
        for m in messages.iter().filter(|m| m.role != Role::System) {
            body.push_str(m.role.as_str());
            body.push_str(": ");
            body.push_str(&m.content);
            body.push('\n');
        }

        ChatRequest {
            messages: vec![
                Message::system(SUMMARIZER_INSTRUCTIONS),
                Message::user(body),
            ],
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
        }
    }
}

#[async_trait(?Send)]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, prior: Option<&str>, messages: &[Message]) -> Result<String> {
        let req = self.build_request(prior, messages);
        let response = self.llm.chat_completion(req).await?;
        Ok(response.message.content)
    }
}
