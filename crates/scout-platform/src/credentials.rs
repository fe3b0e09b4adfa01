//! Credential validators backed by a live call to each provider.

use async_trait::async_trait;
use scout_core::ports::{CredentialValidator, LlmPort, SearchPort};
use crate::llm::OpenAiCompatProvider;
use crate::search::GoogleSearch;

/// A completion key is valid if the provider lists models with it.
pub struct OpenAiKeyValidator {
    provider: OpenAiCompatProvider,
}

impl OpenAiKeyValidator {
    pub fn new(provider: &OpenAiCompatProvider) -> Self {
        Self {
            provider: provider.with_api_key(""),
        }
    }
}

#[async_trait(?Send)]
impl CredentialValidator for OpenAiKeyValidator {
    async fn is_valid(&self, key: &str) -> bool {
        match self.provider.with_api_key(key).list_models().await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("completion key rejected: {}", e);
                false
            }
        }
    }

    fn credential_name(&self) -> &str {
        "OpenAI API key"
    }
}

/// A search key is valid if a test query succeeds against the configured engine.
pub struct GoogleKeyValidator {
    search: GoogleSearch,
}

impl GoogleKeyValidator {
    pub fn new(search: &GoogleSearch) -> Self {
        Self {
            search: search.with_api_key(""),
        }
    }
}

#[async_trait(?Send)]
impl CredentialValidator for GoogleKeyValidator {
    async fn is_valid(&self, key: &str) -> bool {
        match self.search.with_api_key(key).search("test").await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("search key rejected: {}", e);
                false
            }
        }
    }

    fn credential_name(&self) -> &str {
        "Google API key"
    }
}
