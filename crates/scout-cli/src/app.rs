//! Composition root: builds the adapters, hands them to the core, and runs
//! the prompt loop.

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use scout_core::{
    augmenter::NO_RESULTS_NOTICE,
    compaction::{CompactionPolicy, Compactor, LlmSummarizer},
    context::SessionContext,
    credentials::{all_valid, check_credentials},
    event_bus::EventBus,
    ports::CredentialValidator,
    repository::DocumentRepository,
    runtime::ChatRuntime,
    transcript::{SessionChange, TranscriptStore},
};
use scout_platform::{
    credentials::{GoogleKeyValidator, OpenAiKeyValidator},
    llm::OpenAiCompatProvider,
    search::GoogleSearch,
    storage::open_storage,
};
use scout_types::{
    ScoutError,
    config::{ScoutConfig, SUPPORTED_MODELS},
    event::ChatEvent,
};

use crate::commands::{self, Command, HELP};

const SUMMARY_MAX_TOKENS: u32 = 1000;
const EVENT_POLL: Duration = Duration::from_millis(30);

pub struct ScoutApp {
    config: ScoutConfig,
    event_bus: EventBus,
    runtime: ChatRuntime,
    store: TranscriptStore,
    ctx: SessionContext,
    llm: Rc<OpenAiCompatProvider>,
    search: Rc<GoogleSearch>,
}

impl ScoutApp {
    pub async fn new(config: ScoutConfig) -> Result<Self> {
        let llm = Rc::new(OpenAiCompatProvider::new(&config.llm)?);
        let search = Rc::new(GoogleSearch::new(&config.search)?);

        let storage = open_storage(&config.store)?;
        let repo = Rc::new(DocumentRepository::new(storage, config.store.store_id.clone()));
        let mut store = TranscriptStore::open(repo, &config).await?;
        if config.compaction.enabled {
            let summarizer = LlmSummarizer::new(llm.clone(), config.llm.model.clone(), SUMMARY_MAX_TOKENS);
            store = store.with_compaction(Compactor::new(
                CompactionPolicy::from(&config.compaction),
                Rc::new(summarizer),
            ));
        }

        let event_bus = EventBus::new();
        let runtime = ChatRuntime::new(event_bus.clone(), search.clone(), llm.clone());
        let ctx = SessionContext::new("", &config);

        Ok(Self {
            config,
            event_bus,
            runtime,
            store,
            ctx,
            llm,
            search,
        })
    }

    pub(crate) fn active(&self) -> Option<&str> {
        Some(self.ctx.active_session.as_str()).filter(|id| !id.is_empty())
    }

    /// Open `name` (creating it if needed), or the most recently used session.
    pub async fn open_session(&mut self, name: Option<&str>) -> Result<()> {
        let id = match name.map(str::trim) {
            Some(name) if self.store.contains(name) => Some(name.to_string()),
            Some(name) => Some(self.store.create_session(Some(name)).await?),
            None => self
                .store
                .list_sessions()
                .into_iter()
                .max_by(|a, b| a.updated_at.cmp(&b.updated_at))
                .map(|s| s.id),
        };
        if let Some(id) = id {
            self.ctx.switch_to(id);
        }
        Ok(())
    }

    /// Check both API keys against their providers.
    pub async fn validate_credentials(&self) -> bool {
        let openai = OpenAiKeyValidator::new(&self.llm);
        let google = GoogleKeyValidator::new(&self.search);
        let results = check_credentials(&[
            (&openai as &dyn CredentialValidator, self.config.llm.api_key.as_str()),
            (&google as &dyn CredentialValidator, self.config.search.api_key.as_str()),
        ])
        .await;
        for check in &results {
            let status = if check.valid { "ok" } else { "INVALID" };
            println!("{:<16} {}", check.name, status);
        }
        all_valid(&results)
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("Scout: investment research with live web search. /help for commands.");
        if self.config.llm.api_key.is_empty() || self.config.search.api_key.is_empty() {
            eprintln!("warning: API keys are not configured; run with --validate to check them");
        }

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("[{}] > ", self.active().unwrap_or("new session"));
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let Some(command) = commands::parse(&line?) else {
                continue;
            };
            if command == Command::Quit {
                break;
            }
            if let Err(e) = self.dispatch(command).await {
                self.report(&e);
            }
        }
        Ok(())
    }

    fn report(&self, e: &ScoutError) {
        eprintln!("error: {e}");
        if self.store.has_pending() {
            eprintln!("the last change was not saved; /retry to write it again or /discard to drop it");
        }
    }

    async fn dispatch(&mut self, command: Command) -> scout_types::Result<()> {
        match command {
            Command::Chat(text) => self.chat(&text).await?,
            Command::New(name) => {
                let id = self.store.create_session(name.as_deref()).await?;
                println!("created session '{id}'");
                self.ctx.switch_to(id);
            }
            Command::Rename(name) => {
                let old = self.require_active()?;
                self.store.rename_session(&old, &name).await?;
                self.ctx.switch_to(name.trim());
            }
            Command::Switch(arg) => {
                let session = if self.store.contains(&arg) {
                    self.store.select_session(arg.as_str())?
                } else {
                    match arg.parse::<usize>() {
                        Ok(n) if n >= 1 => self.store.select_session(n - 1)?,
                        _ => return Err(ScoutError::SessionNotFound(arg)),
                    }
                };
                println!("switched to '{}' ({} messages)", session.id, session.conversation().len());
                self.ctx.switch_to(session.id);
            }
            Command::List => self.print_sessions(),
            Command::Clear => {
                let id = self.require_active()?;
                self.store.clear_session(&id).await?;
                println!("cleared '{id}'");
            }
            Command::Delete(name) => {
                let id = match name {
                    Some(name) => name,
                    None => self.require_active()?,
                };
                self.store.delete_session(&id).await?;
                println!("deleted '{id}'");
                self.ctx.follow(&SessionChange::Deleted(id));
            }
            Command::Model(None) => {
                println!("model: {} (available: {})", self.ctx.model, SUPPORTED_MODELS.join(", "));
            }
            Command::Model(Some(model)) => {
                self.ctx.set_model(&model)?;
                println!("model set to {model}");
            }
            Command::Compact => {
                let id = self.require_active()?;
                if self.store.compact_session(&id).await? {
                    println!("older messages of '{id}' summarized");
                } else {
                    println!("nothing to summarize");
                }
            }
            Command::Retry => match self.store.retry_pending().await? {
                Some(change) => {
                    self.ctx.follow(&change);
                    println!("saved");
                }
                None => println!("nothing to retry"),
            },
            Command::Discard => self.store.discard_pending(),
            Command::Help => println!("{HELP}"),
            Command::Unknown(line) => println!("unknown command: {line} (try /help)"),
            Command::Quit => {}
        }
        Ok(())
    }

    fn require_active(&self) -> scout_types::Result<String> {
        self.active()
            .map(String::from)
            .ok_or_else(|| ScoutError::InvalidInput("no active session".to_string()))
    }

    fn print_sessions(&self) {
        let sessions = self.store.list_sessions();
        if sessions.is_empty() {
            println!("no sessions yet");
            return;
        }
        for (i, s) in sessions.iter().enumerate() {
            let marker = if self.active() == Some(s.id.as_str()) { '*' } else { ' ' };
            let compacted = if s.compacted { ", summarized" } else { "" };
            println!(
                "{marker}{:>3}. {} ({} messages{compacted}) {}",
                i + 1,
                s.id,
                s.message_count,
                s.updated_at
            );
        }
    }

    async fn chat(&mut self, text: &str) -> scout_types::Result<()> {
        if self.active().is_none() {
            let id = self.store.create_session_from_message(text).await?;
            self.ctx.switch_to(id);
        }

        let bus = self.event_bus.clone();
        let mut printer = EventPrinter::default();
        let turn = self.runtime.run_turn(&self.ctx, &mut self.store, text);
        tokio::pin!(turn);
        let mut ticker = tokio::time::interval(EVENT_POLL);
        let result = loop {
            tokio::select! {
                result = &mut turn => break result,
                _ = ticker.tick() => printer.print(bus.drain()),
            }
        };
        printer.print(bus.drain());

        let outcome = result?;
        if printer.streamed {
            println!("{}", outcome.sources_markdown());
        } else {
            println!("{}", outcome.render_markdown());
        }
        println!();
        Ok(())
    }
}

/// Renders runtime events to the terminal as they arrive.
#[derive(Default)]
struct EventPrinter {
    streamed: bool,
}

impl EventPrinter {
    fn print(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::SearchComplete { sources } => {
                    eprintln!("(web search: {} sources)", sources.len());
                }
                ChatEvent::SearchUnavailable { message } => {
                    log::warn!("search unavailable: {}", message);
                    eprintln!("{NO_RESULTS_NOTICE}");
                }
                ChatEvent::LlmDelta { token } => {
                    print!("{token}");
                    let _ = io::stdout().flush();
                    self.streamed = true;
                }
                ChatEvent::SessionCompacted { session_id, .. } => {
                    eprintln!("(older messages of '{session_id}' summarized)");
                }
                ChatEvent::TurnStart { turn_id, session_id } => {
                    log::debug!("turn {} started in '{}'", turn_id, session_id);
                }
                ChatEvent::LlmComplete { .. } | ChatEvent::TurnEnd { .. } | ChatEvent::Error { .. } => {}
            }
        }
    }
}
