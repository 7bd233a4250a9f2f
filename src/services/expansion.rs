//! Query expansion: one search string in, a few alternates out.
//!
//! The alternates (translations, spelling fixes, synonyms) widen recall of
//! the plain substring search over events. Expansion is best-effort: any
//! failure degrades to the original query alone.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clients::llm::ChatClient;
use crate::config::ExpansionConfig;
use crate::db::Store;

/// Candidates longer than this are dropped rather than sent to the store.
const MAX_TERM_CHARS: usize = 80;

/// The cache lookup may use at most `timeout / CACHE_READ_SHARE`.
const CACHE_READ_SHARE: u32 = 4;

/// Ordered, deduplicated alternates for one query. The trimmed original is
/// always the first element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedTermSet {
    terms: Vec<String>,
}

impl ExpandedTermSet {
    #[must_use]
    pub fn identity(query: &str) -> Self {
        Self {
            terms: vec![query.trim().to_string()],
        }
    }

    /// Normalizes raw candidates: trims, drops empties and overlong strings,
    /// dedupes case-insensitively and caps the set at `max_terms`.
    #[must_use]
    pub fn from_candidates<I>(original: &str, candidates: I, max_terms: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let original = original.trim();
        let max_terms = max_terms.max(1);

        let mut seen = HashSet::new();
        seen.insert(original.to_lowercase());
        let mut terms = vec![original.to_string()];

        for candidate in candidates {
            if terms.len() >= max_terms {
                break;
            }

            let term = candidate.trim();
            if term.is_empty() || term.chars().count() > MAX_TERM_CHARS {
                continue;
            }

            if seen.insert(term.to_lowercase()) {
                terms.push(term.to_string());
            }
        }

        Self { terms }
    }

    #[must_use]
    pub fn original(&self) -> &str {
        &self.terms[0]
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True when the set holds more than the original query.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.terms.len() > 1
    }

    #[must_use]
    pub fn into_terms(self) -> Vec<String> {
        self.terms
    }
}

/// Produces an [`ExpandedTermSet`] for a trimmed, non-empty query.
///
/// Implementations never fail; they fall back to [`ExpandedTermSet::identity`].
#[async_trait]
pub trait QueryExpander: Send + Sync {
    async fn expand(&self, query: &str) -> ExpandedTermSet;
}

/// Expander used when no language model is configured.
pub struct IdentityExpander;

#[async_trait]
impl QueryExpander for IdentityExpander {
    async fn expand(&self, query: &str) -> ExpandedTermSet {
        ExpandedTermSet::identity(query)
    }
}

/// Shapes the model is known to answer with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpansionPayload {
    Object {
        #[serde(alias = "queries", alias = "expansions")]
        terms: Vec<serde_json::Value>,
    },
    List(Vec<serde_json::Value>),
}

impl ExpansionPayload {
    fn into_candidates(self) -> Vec<String> {
        let values = match self {
            Self::Object { terms } => terms,
            Self::List(values) => values,
        };

        values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

/// Parses the model's message content into candidate strings.
///
/// Accepts `{"terms": [...]}` or a bare array, optionally wrapped in a
/// Markdown code fence. Non-string entries are ignored.
pub fn parse_expansion(content: &str) -> Result<Vec<String>, serde_json::Error> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    let payload: ExpansionPayload = serde_json::from_str(unfenced.trim())?;
    Ok(payload.into_candidates())
}

fn build_system_prompt(locales: &[String], max_terms: usize) -> String {
    format!(
        "You expand search queries for a local event discovery site published in these \
         locales: {}. Given the user's search text, return likely translations of it into \
         those locales, corrected spellings, and close synonyms that could appear in event \
         titles, descriptions or venue names. Respond only with a JSON object of the form \
         {{\"terms\": [\"...\"]}} holding at most {} strings, most useful first.",
        locales.join(", "),
        max_terms
    )
}

/// Expander backed by a hosted language model, with an optional TTL cache
/// in the event store.
pub struct LlmQueryExpander {
    chat: ChatClient,
    cache: Option<Store>,
    locales: Vec<String>,
    max_terms: usize,
    timeout: Duration,
    cache_ttl: chrono::Duration,
}

impl LlmQueryExpander {
    #[must_use]
    pub fn new(chat: ChatClient, config: &ExpansionConfig, cache: Option<Store>) -> Self {
        let ttl_seconds = i64::try_from(config.cache_ttl_seconds).unwrap_or(i64::MAX);
        Self {
            chat,
            cache: cache.filter(|_| config.cache_enabled && config.cache_ttl_seconds > 0),
            locales: config.locales.clone(),
            max_terms: config.max_terms.max(1),
            timeout: Duration::from_millis(config.timeout_ms),
            cache_ttl: chrono::Duration::try_seconds(ttl_seconds)
                .unwrap_or_else(|| chrono::Duration::minutes(10)),
        }
    }

    fn fallback(query: &str, reason: &'static str) -> ExpandedTermSet {
        metrics::counter!("query_expansion_fallbacks_total", "reason" => reason).increment(1);
        ExpandedTermSet::identity(query)
    }

    async fn cached(&self, key: &str) -> Option<Vec<String>> {
        let store = self.cache.as_ref()?;

        match store.get_cached_expansion(key, Utc::now()).await {
            Ok(Some(terms)) => {
                metrics::counter!("query_expansion_cache_hits_total").increment(1);
                debug!(query = %key, terms = terms.len(), "Expansion cache hit");
                Some(terms)
            }
            Ok(None) => {
                debug!(query = %key, "Expansion cache miss");
                None
            }
            Err(e) => {
                warn!(error = %e, "Expansion cache read failed");
                None
            }
        }
    }

    /// Writes happen off the request path; a slow or locked store only
    /// delays the cache, never the caller.
    fn store_in_cache(&self, key: String, set: &ExpandedTermSet) {
        let Some(store) = self.cache.clone() else {
            return;
        };
        let terms = set.terms().to_vec();
        let ttl = self.cache_ttl;

        tokio::spawn(async move {
            if let Err(e) = store.cache_expansion(&key, &terms, ttl).await {
                warn!(error = %e, "Expansion cache write failed");
            }
        });
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    async fn expand(&self, query: &str) -> ExpandedTermSet {
        let query = query.trim();
        if query.is_empty() {
            return ExpandedTermSet::identity(query);
        }

        // One budget for the whole call, cache lookup included.
        let deadline = Instant::now() + self.timeout;
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);

        let cache_key = query.to_lowercase();
        match tokio::time::timeout(self.timeout / CACHE_READ_SHARE, self.cached(&cache_key)).await
        {
            Ok(Some(terms)) => {
                return ExpandedTermSet::from_candidates(query, terms, self.max_terms);
            }
            Ok(None) => {}
            Err(_) => warn!(query = %cache_key, "Expansion cache read timed out; treating as miss"),
        }

        let system = build_system_prompt(&self.locales, self.max_terms);
        let content = match tokio::time::timeout_at(
            deadline,
            self.chat.complete_json(&system, query),
        )
        .await
        {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                warn!(error = %e, "Query expansion failed; falling back to original query");
                return Self::fallback(query, "error");
            }
            Err(_) => {
                warn!(
                    timeout_ms,
                    "Query expansion timed out; falling back to original query"
                );
                return Self::fallback(query, "timeout");
            }
        };

        let candidates = match parse_expansion(&content) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Query expansion returned invalid JSON; falling back to original query");
                return Self::fallback(query, "invalid_output");
            }
        };

        let set = ExpandedTermSet::from_candidates(query, candidates, self.max_terms);
        info!(
            query = %query,
            model = %self.chat.model(),
            terms = set.len(),
            "Query expanded"
        );

        self.store_in_cache(cache_key, &set);
        set
    }
}

/// Picks the expander for the given settings. Without an API key the
/// identity expander is used and no network calls are made.
#[must_use]
pub fn build_expander(
    config: &ExpansionConfig,
    http_client: reqwest::Client,
    store: Store,
) -> Arc<dyn QueryExpander> {
    match config.api_key.as_deref() {
        Some(api_key) if config.is_active() => {
            let chat = ChatClient::with_shared_client(
                http_client,
                &config.base_url,
                api_key,
                config.model.clone(),
                config.temperature,
            );
            Arc::new(LlmQueryExpander::new(chat, config, Some(store)))
        }
        _ => {
            info!("Query expansion disabled; searching with the original query only");
            Arc::new(IdentityExpander)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_original_is_always_first() {
        let set = ExpandedTermSet::from_candidates(
            "  coffe ",
            strings(&["coffee", "cà phê", "coffe"]),
            6,
        );
        assert_eq!(set.terms(), strings(&["coffe", "coffee", "cà phê"]).as_slice());
        assert_eq!(set.original(), "coffe");
        assert!(set.is_expanded());
    }

    #[test]
    fn test_dedupes_case_insensitively_and_drops_blanks() {
        let set = ExpandedTermSet::from_candidates(
            "Yoga",
            strings(&["yoga", "  ", "", "YOGA CLASS", "yoga class", "요가"]),
            6,
        );
        assert_eq!(set.terms(), strings(&["Yoga", "YOGA CLASS", "요가"]).as_slice());
    }

    #[test]
    fn test_caps_at_max_terms() {
        let set =
            ExpandedTermSet::from_candidates("jazz", strings(&["a1", "b2", "c3", "d4", "e5"]), 3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.original(), "jazz");

        let set = ExpandedTermSet::from_candidates("jazz", strings(&["blues"]), 0);
        assert_eq!(set.terms(), strings(&["jazz"]).as_slice());
    }

    #[test]
    fn test_drops_overlong_candidates() {
        let long = "x".repeat(MAX_TERM_CHARS + 1);
        let set = ExpandedTermSet::from_candidates("market", vec![long, "chợ".to_string()], 6);
        assert_eq!(set.terms(), strings(&["market", "chợ"]).as_slice());
    }

    #[test]
    fn test_identity_is_not_expanded() {
        let set = ExpandedTermSet::identity(" surf ");
        assert_eq!(set.terms(), strings(&["surf"]).as_slice());
        assert!(!set.is_expanded());
    }

    #[test]
    fn test_parse_object_and_array_payloads() {
        assert_eq!(
            parse_expansion(r#"{"terms": ["coffee", "cà phê"]}"#).unwrap(),
            strings(&["coffee", "cà phê"])
        );
        assert_eq!(
            parse_expansion(r#"{"queries": ["coffee"]}"#).unwrap(),
            strings(&["coffee"])
        );
        assert_eq!(
            parse_expansion(r#"["coffee", 3, null, "커피"]"#).unwrap(),
            strings(&["coffee", "커피"])
        );
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let content = "```json\n{\"terms\": [\"coffee\"]}\n```";
        assert_eq!(parse_expansion(content).unwrap(), strings(&["coffee"]));
    }

    #[test]
    fn test_parse_rejects_unexpected_shapes() {
        assert!(parse_expansion("coffee, cà phê").is_err());
        assert!(parse_expansion(r#"{"answer": "coffee"}"#).is_err());
        assert!(parse_expansion(r#"{"terms": "coffee"}"#).is_err());
    }

    #[test]
    fn test_system_prompt_names_locales() {
        let prompt = build_system_prompt(&strings(&["en", "vi"]), 5);
        assert!(prompt.contains("en, vi"));
        assert!(prompt.contains("at most 5"));
    }

    #[tokio::test]
    async fn test_identity_expander() {
        let set = IdentityExpander.expand("night market").await;
        assert_eq!(set.terms(), strings(&["night market"]).as_slice());
    }
}
