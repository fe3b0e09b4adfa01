//! Per-conversation settings handed to every turn.

use scout_types::{
    Result, ScoutError,
    config::{ScoutConfig, SUPPORTED_MODELS},
    search::ExclusionMode,
};
use crate::transcript::SessionChange;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub active_session: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub streaming: bool,
    pub excluded_domains: Vec<String>,
    pub exclusion_mode: ExclusionMode,
}

impl SessionContext {
    pub fn new(active_session: impl Into<String>, config: &ScoutConfig) -> Self {
        Self {
            active_session: active_session.into(),
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            streaming: config.llm.stream,
            excluded_domains: config.search.excluded_domains.clone(),
            exclusion_mode: config.search.exclusion_mode,
        }
    }

    pub fn switch_to(&mut self, session_id: impl Into<String>) {
        self.active_session = session_id.into();
    }

    /// Track a committed store change: a created session becomes active, and
    /// renaming or deleting the active session carries over to it.
    pub fn follow(&mut self, change: &SessionChange) {
        match change {
            SessionChange::Created(id) => self.switch_to(id.as_str()),
            SessionChange::Renamed { from, to } if *from == self.active_session => {
                self.switch_to(to.as_str())
            }
            SessionChange::Deleted(id) if *id == self.active_session => self.switch_to(""),
            _ => {}
        }
    }

    /// Pick a model from the supported list.
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        if !SUPPORTED_MODELS.contains(&model) {
            return Err(ScoutError::InvalidInput(format!(
                "unsupported model '{model}' (choose one of: {})",
                SUPPORTED_MODELS.join(", ")
            )));
        }
        self.model = model.to_string();
        Ok(())
    }
}
