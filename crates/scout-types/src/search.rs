use serde::{Deserialize, Serialize};

/// One hit returned by the search provider. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    pub fn new(link: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Prompt-insertable context block plus the citation list it came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    pub context: String,
    pub sources: Vec<String>,
}

impl SearchContext {
    /// Zero results after filtering. Distinct from a failed search.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// How excluded domains are matched against result links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionMode {
    /// Link contains the domain anywhere, case-sensitive
    #[default]
    Substring,
    /// Link host equals the domain or is a subdomain of it
    HostSuffix,
}
