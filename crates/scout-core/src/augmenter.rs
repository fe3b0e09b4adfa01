//! Search augmentation: one query becomes a context block plus citations.
//!
//! One provider call per query. Results whose link matches an excluded domain
//! are dropped, the survivors' snippets are joined with newlines in provider
//! order, and their links become the source list.

use std::rc::Rc;
use scout_types::{
    Result, ScoutError,
    search::{ExclusionMode, SearchContext, SearchResult},
};
use crate::ports::SearchPort;

/// Shown to the user when the search call itself failed.
pub const NO_RESULTS_NOTICE: &str =
    "No search results found. Please refine your query or try again.";

pub struct SearchAugmenter {
    provider: Rc<dyn SearchPort>,
}

impl SearchAugmenter {
    pub fn new(provider: Rc<dyn SearchPort>) -> Self {
        Self { provider }
    }

    /// Search and reduce the results to a context block.
    ///
    /// Fails with `SearchUnavailable` when the provider fails. Zero surviving
    /// results is not an error: the context and sources come back empty.
    pub async fn search(
        &self,
        query: &str,
        excluded_domains: &[String],
        mode: ExclusionMode,
    ) -> Result<SearchContext> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScoutError::InvalidInput("search query is empty".to_string()));
        }

        let results = self.provider.search(query).await.map_err(|e| match e {
            ScoutError::SearchUnavailable(msg) => ScoutError::SearchUnavailable(msg),
            other => ScoutError::SearchUnavailable(other.to_string()),
        })?;

        let total = results.len();
        let context = assemble(results, excluded_domains, mode);
        log::debug!(
            "search via {}: {} results, {} after exclusions",
            self.provider.provider_name(),
            total,
            context.sources.len()
        );
        Ok(context)
    }
}

/// Filter and join results. Order and duplicates are preserved.
pub fn assemble(
    results: Vec<SearchResult>,
    excluded_domains: &[String],
    mode: ExclusionMode,
) -> SearchContext {
    let (snippets, sources): (Vec<String>, Vec<String>) = results
        .into_iter()
        .filter(|r| !r.link.is_empty())
        .filter(|r| !is_excluded(&r.link, excluded_domains, mode))
        .map(|r| (r.snippet, r.link))
        .unzip();

    SearchContext {
        context: snippets.join("\n"),
        sources,
    }
}

/// Whether `link` matches any excluded domain under `mode`.
pub fn is_excluded(link: &str, excluded_domains: &[String], mode: ExclusionMode) -> bool {
    match mode {
        ExclusionMode::Substring => excluded_domains
            .iter()
            .filter(|d| !d.is_empty())
            .any(|d| link.contains(d.as_str())),
        ExclusionMode::HostSuffix => {
            let Some(host) = link_host(link) else {
                return false;
            };
            excluded_domains
                .iter()
                .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .any(|d| host == d || host.ends_with(&format!(".{d}")))
        }
    }
}

/// Lowercased host of a link, with or without a scheme.
fn link_host(link: &str) -> Option<String> {
    let rest = match link.find("://") {
        Some(idx) => &link[idx + 3..],
        None => link,
    };
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = match host_port.rfind(':') {
        Some(idx) if !host_port.starts_with('[') => &host_port[..idx],
        _ => host_port,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.trim_end_matches('.').to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_host_handles_schemes_ports_and_userinfo() {
        assert_eq!(link_host("https://www.Reddit.com/r/x").as_deref(), Some("www.reddit.com"));
        assert_eq!(link_host("a.com/1").as_deref(), Some("a.com"));
        assert_eq!(link_host("http://user@b.com:8080/p?q=1").as_deref(), Some("b.com"));
        assert_eq!(link_host("https:///nohost"), None);
    }

    #[test]
    fn substring_mode_matches_anywhere_in_link() {
        let excluded = vec!["reddit.com".to_string()];
        assert!(is_excluded(
            "https://example.org/?ref=reddit.com",
            &excluded,
            ExclusionMode::Substring
        ));
        assert!(!is_excluded(
            "https://example.org/?ref=reddit.com",
            &excluded,
            ExclusionMode::HostSuffix
        ));
    }

    #[test]
    fn substring_mode_is_case_sensitive() {
        let excluded = vec!["reddit.com".to_string()];
        assert!(!is_excluded("https://REDDIT.COM/r/x", &excluded, ExclusionMode::Substring));
        assert!(is_excluded("https://REDDIT.COM/r/x", &excluded, ExclusionMode::HostSuffix));
    }

    #[test]
    fn host_suffix_mode_matches_subdomains_only() {
        let excluded = vec!["spam.com".to_string()];
        assert!(is_excluded("https://spam.com/a", &excluded, ExclusionMode::HostSuffix));
        assert!(is_excluded("https://www.spam.com/a", &excluded, ExclusionMode::HostSuffix));
        assert!(!is_excluded("https://notspam.com/a", &excluded, ExclusionMode::HostSuffix));
    }

    #[test]
    fn empty_domain_never_excludes() {
        let excluded = vec![String::new()];
        assert!(!is_excluded("a.com/1", &excluded, ExclusionMode::Substring));
        assert!(!is_excluded("a.com/1", &excluded, ExclusionMode::HostSuffix));
    }
}
