use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use scout_types::config::ScoutConfig;

pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GOOGLE_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const GOOGLE_CSE_VAR: &str = "GOOGLE_CSE_ID";

#[derive(Debug, Parser)]
#[command(name = "scout")]
#[command(about = "Search-augmented investment research chat", version)]
pub struct Cli {
    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Completion model
    #[arg(long)]
    pub model: Option<String>,

    /// Directory for the transcript store
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Session to open (created if missing)
    #[arg(long)]
    pub session: Option<String>,

    /// Wait for whole replies instead of streaming tokens
    #[arg(long)]
    pub no_stream: bool,

    /// Check the configured credentials and exit
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    /// Config file, then environment, then flags.
    pub fn resolve_config(&self) -> Result<ScoutConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => ScoutConfig::default(),
        };
        apply_env(&mut config, |name| std::env::var(name).ok());
        self.apply_flags(&mut config);
        Ok(config)
    }

    pub fn apply_flags(&self, config: &mut ScoutConfig) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.store.data_dir = dir.to_string_lossy().into_owned();
        }
        if self.no_stream {
            config.llm.stream = false;
        }
    }
}

pub fn load_config_file(path: &Path) -> Result<ScoutConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(config)
}

/// Fill credentials from the environment. Set, non-blank variables win.
pub fn apply_env(config: &mut ScoutConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    if let Some(key) = var(OPENAI_KEY_VAR) {
        config.llm.api_key = key;
    }
    if let Some(key) = var(GOOGLE_KEY_VAR) {
        config.search.api_key = key;
    }
    if let Some(id) = var(GOOGLE_CSE_VAR) {
        config.search.engine_id = id;
    }
}
