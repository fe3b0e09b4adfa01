use serde::{Deserialize, Serialize};
use crate::search::ExclusionMode;

/// Models offered to the user. Selection is a plain pick from this list.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4o-mini",
    "gpt-4o",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Upper bound on one streamed completion, body included
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 300;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
    pub compaction: CompactionConfig,
    pub system_prompt: String,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
            compaction: CompactionConfig::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
    pub timeout_secs: u64,
    pub stream_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: SUPPORTED_MODELS[0].to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: 4000,
            temperature: 0.2,
            stream: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stream_timeout_secs: DEFAULT_STREAM_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    OpenAI,
    DeepSeek,
    Custom,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
            LlmProvider::Custom => "",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
    pub endpoint: String,
    pub excluded_domains: Vec<String>,
    pub exclusion_mode: ExclusionMode,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            engine_id: String::new(),
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            excluded_domains: vec!["reddit.com".to_string()],
            exclusion_mode: ExclusionMode::Substring,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StorageBackendType,
    /// Directory for the file backend
    pub data_dir: String,
    /// Key of the transcript document inside the backend
    pub store_id: String,
    /// New and cleared sessions start with the system prompt as message 0
    pub seed_system_prompt: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
            data_dir: ".scout".to_string(),
            store_id: "db".to_string(),
            seed_system_prompt: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// File backend, falling back to memory if the directory is unusable
    Auto,
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    pub enabled: bool,
    /// Compaction starts once a session holds more than this many messages
    pub threshold: usize,
    /// Raw messages always sent verbatim after the summary
    pub keep_recent: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 5,
            keep_recent: 4,
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an investment analyst designed to assist users in evaluating potential investments. \
Your primary goal is to guide users through the investment evaluation process by providing insightful analysis and encouraging deeper exploration based on their responses. \
After providing an answer, always offer the user options for next action items (e.g., 'Would you like me to explore further details on...?') to facilitate a comprehensive understanding. \
When a user inquires about a potential investment, ask pertinent questions regarding the investment type, location, market trends, and other relevant factors to ensure a thorough analysis. \
Always utilize the most recent information available, as your responses should be as current and relevant as possible. \
Note: Do not mention any information cutoff dates, as you have access to live web search capabilities. \
Ensure that all information provided is accurate and up-to-date, and refrain from making up any information.";
