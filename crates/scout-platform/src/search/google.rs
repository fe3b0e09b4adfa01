//! Google Custom Search JSON API adapter.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use scout_core::ports::SearchPort;
use scout_types::{Result, ScoutError, config::SearchConfig, search::SearchResult};

pub struct GoogleSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    timeout_ms: u64,
}

impl GoogleSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScoutError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            engine_id: config.engine_id.clone(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    /// Same engine, different key. Used for validation.
    pub fn with_api_key(&self, api_key: &str) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            api_key: api_key.to_string(),
            engine_id: self.engine_id.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

#[async_trait(?Send)]
impl SearchPort for GoogleSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoutError::Timeout(self.timeout_ms)
                } else {
                    ScoutError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::SearchUnavailable(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScoutError::Network(e.to_string()))?;
        let results = parse_results(&body)?;
        log::debug!("custom search returned {} results", results.len());
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        "google-cse"
    }
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
struct CseItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Parse a Custom Search response body. A missing `items` array means no results.
pub fn parse_results(body: &str) -> Result<Vec<SearchResult>> {
    let parsed: CseResponse = serde_json::from_str(body)
        .map_err(|e| ScoutError::SearchUnavailable(format!("malformed response: {e}")))?;
    Ok(parsed
        .items
        .into_iter()
        .map(|item| SearchResult::new(item.link, item.snippet))
        .collect())
}
