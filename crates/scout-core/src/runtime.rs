//! Chat runtime: one search-augmented turn.
//!
//! Implements the augment → complete → persist cycle:
//! 1. Search the web for the user's text and build a context block
//! 2. Append the user message to the active session
//! 3. Send the session history plus the context block to the LLM
//! 4. Append the assistant reply and persist
//!
//! A failed search does not stop the turn; a failed completion does, and no
//! partial assistant message is stored.

use std::rc::Rc;
use futures::StreamExt;
use scout_types::{
    Result, ScoutError,
    event::ChatEvent,
    message::Message,
    search::SearchContext,
};
use crate::augmenter::{NO_RESULTS_NOTICE, SearchAugmenter};
use crate::context::SessionContext;
use crate::event_bus::EventBus;
use crate::ports::*;
use crate::transcript::TranscriptStore;

pub struct ChatRuntime {
    pub event_bus: EventBus,
    pub state: RuntimeState,
    augmenter: SearchAugmenter,
    llm: Rc<dyn LlmPort>,
    turn_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeState {
    Idle,
    Searching,
    Thinking,
    Error(String),
}

/// What the front end shows after a turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub sources: Vec<String>,
    /// Set when the search failed and the reply is ungrounded
    pub search_notice: Option<String>,
}

impl TurnOutcome {
    /// Reply followed by a markdown source list, if any.
    pub fn render_markdown(&self) -> String {
        format!("{}{}", self.reply, self.sources_markdown())
    }

    /// Just the source list, for front ends that already printed the reply.
    pub fn sources_markdown(&self) -> String {
        let mut out = String::new();
        if !self.sources.is_empty() {
            out.push_str("\n\n**Sources:**");
            for source in &self.sources {
                out.push_str(&format!("\n- [{source}]({source})"));
            }
        }
        out
    }
}

impl ChatRuntime {
    pub fn new(event_bus: EventBus, search: Rc<dyn SearchPort>, llm: Rc<dyn LlmPort>) -> Self {
        Self {
            event_bus,
            state: RuntimeState::Idle,
            augmenter: SearchAugmenter::new(search),
            llm,
            turn_counter: 0,
        }
    }

    /// Run one full turn for `ctx.active_session`.
    pub async fn run_turn(
        &mut self,
        ctx: &SessionContext,
        store: &mut TranscriptStore,
        user_input: &str,
    ) -> Result<TurnOutcome> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(ScoutError::InvalidInput("message is empty".to_string()));
        }
        let session_id = ctx.active_session.as_str();
        store.select_session(session_id)?;

        self.turn_counter += 1;
        let turn_id = self.turn_counter;
        self.event_bus.emit(ChatEvent::TurnStart {
            turn_id,
            session_id: session_id.to_string(),
        });

        // Augment
        self.state = RuntimeState::Searching;
        let (search, search_notice) = match self
            .augmenter
            .search(user_input, &ctx.excluded_domains, ctx.exclusion_mode)
            .await
        {
            Ok(found) => {
                self.event_bus.emit(ChatEvent::SearchComplete {
                    sources: found.sources.clone(),
                });
                (found, None)
            }
            Err(e) => {
                log::warn!("search failed, continuing without context: {}", e);
                self.event_bus.emit(ChatEvent::SearchUnavailable {
                    message: e.to_string(),
                });
                (SearchContext::default(), Some(NO_RESULTS_NOTICE.to_string()))
            }
        };

        let outcome = self
            .complete_turn(ctx, store, user_input, search, search_notice)
            .await;
        match &outcome {
            Ok(_) => self.state = RuntimeState::Idle,
            Err(e) => {
                self.state = RuntimeState::Error(e.to_string());
                self.event_bus.emit(ChatEvent::Error {
                    message: e.to_string(),
                });
            }
        }
        self.event_bus.emit(ChatEvent::TurnEnd { turn_id });
        outcome
    }

    async fn complete_turn(
        &mut self,
        ctx: &SessionContext,
        store: &mut TranscriptStore,
        user_input: &str,
        search: SearchContext,
        search_notice: Option<String>,
    ) -> Result<TurnOutcome> {
        let session_id = ctx.active_session.as_str();
        let summarized_before = store.select_session(session_id)?.summarized_through;
        store
            .append_message(session_id, Message::user(user_input))
            .await?;

        let mut messages = store.prompt_messages(session_id)?;
        if !search.context.is_empty() {
            messages.push(Message::system(format!(
                "Web Search Results:\n{}",
                search.context
            )));
        }

        self.state = RuntimeState::Thinking;
        let req = ChatRequest {
            messages,
            model: ctx.model.clone(),
            max_tokens: ctx.max_tokens,
            temperature: ctx.temperature,
        };
        let reply = if ctx.streaming {
            self.drain_stream(req).await?
        } else {
            self.llm.chat_completion(req).await?.message.content
        };
        self.event_bus.emit(ChatEvent::LlmComplete {
            text: reply.clone(),
        });

        store
            .append_message(session_id, Message::assistant(reply.clone()))
            .await?;
        let summarized_through = store.select_session(session_id)?.summarized_through;
        if summarized_through != summarized_before {
            self.event_bus.emit(ChatEvent::SessionCompacted {
                session_id: session_id.to_string(),
                summarized_through,
            });
        }

        Ok(TurnOutcome {
            reply,
            sources: search.sources,
            search_notice,
        })
    }

    /// Consume a token stream into the final reply text.
    async fn drain_stream(&self, req: ChatRequest) -> Result<String> {
        let mut stream = self.llm.stream_chat(req);
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            match event {
                LlmStreamEvent::Delta(token) => {
                    text.push_str(&token);
                    self.event_bus.emit(ChatEvent::LlmDelta { token });
                }
                LlmStreamEvent::Done => return Ok(text),
                LlmStreamEvent::Error(message) => return Err(ScoutError::Llm(message)),
            }
        }
        Err(ScoutError::Llm("reply stream ended without completing".to_string()))
    }
}
