//! Type-ahead suggestions over published events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::SuggestionConfig;
use crate::db::Store;
use crate::models::event::{Event, EventSuggestion};
use crate::services::expansion::QueryExpander;

/// Read access to published events needed by the suggestion path.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Published events matching any term as a literal, case-insensitive
    /// substring of title, description or location, newest start first.
    async fn search_published(&self, terms: &[String], limit: u64) -> anyhow::Result<Vec<Event>>;
}

#[async_trait]
impl EventSource for Store {
    async fn search_published(&self, terms: &[String], limit: u64) -> anyhow::Result<Vec<Event>> {
        self.search_published_events(terms, limit).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub suggestions: Vec<EventSuggestion>,

    /// Present only when expansion produced more than the original term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_terms: Option<Vec<String>>,
}

pub struct SuggestionService {
    expander: Arc<dyn QueryExpander>,
    events: Arc<dyn EventSource>,
    min_query_length: usize,
    limit: u64,
}

impl SuggestionService {
    #[must_use]
    pub fn new(
        expander: Arc<dyn QueryExpander>,
        events: Arc<dyn EventSource>,
        config: &SuggestionConfig,
    ) -> Self {
        Self {
            expander,
            events,
            min_query_length: config.min_query_length,
            limit: config.limit,
        }
    }

    pub async fn suggest(&self, raw_query: &str) -> SuggestionResponse {
        self.suggest_at(raw_query, Utc::now()).await
    }

    /// Runs the suggestion pipeline with lifecycles computed against `now`.
    ///
    /// Never fails: short queries and store errors both yield an empty list.
    pub async fn suggest_at(&self, raw_query: &str, now: DateTime<Utc>) -> SuggestionResponse {
        let query = raw_query.trim();
        if query.chars().count() < self.min_query_length {
            metrics::counter!("search_suggestions_total", "outcome" => "skipped").increment(1);
            return SuggestionResponse::default();
        }

        let expanded = self.expander.expand(query).await;
        let expanded_terms = expanded
            .is_expanded()
            .then(|| expanded.terms().to_vec());

        let events = match self
            .events
            .search_published(expanded.terms(), self.limit)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, query = %query, "Suggestion store query failed");
                metrics::counter!("search_suggestions_total", "outcome" => "store_error")
                    .increment(1);
                return SuggestionResponse {
                    suggestions: vec![],
                    expanded_terms,
                };
            }
        };

        let suggestions: Vec<EventSuggestion> = events
            .into_iter()
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .map(|event| EventSuggestion::from_event(event, now))
            .collect();

        debug!(
            query = %query,
            terms = expanded.len(),
            results = suggestions.len(),
            "Suggestions resolved"
        );
        metrics::counter!("search_suggestions_total", "outcome" => "ok").increment(1);

        SuggestionResponse {
            suggestions,
            expanded_terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Lifecycle;
    use crate::models::event::EventStatus;
    use crate::services::expansion::ExpandedTermSet;
    use chrono::Duration;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedExpander {
        extra: Vec<String>,
        calls: AtomicUsize,
    }

    impl FixedExpander {
        fn new(extra: &[&str]) -> Self {
            Self {
                extra: extra.iter().map(|s| (*s).to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryExpander for FixedExpander {
        async fn expand(&self, query: &str) -> ExpandedTermSet {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ExpandedTermSet::from_candidates(query, self.extra.clone(), 6)
        }
    }

    #[derive(Default)]
    struct RecordingSource {
        events: Vec<Event>,
        fail: bool,
        seen_terms: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EventSource for RecordingSource {
        async fn search_published(
            &self,
            terms: &[String],
            limit: u64,
        ) -> anyhow::Result<Vec<Event>> {
            self.seen_terms.lock().unwrap().push(terms.to_vec());
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(self
                .events
                .iter()
                .take(usize::try_from(limit).unwrap())
                .cloned()
                .collect())
        }
    }

    fn event(id: i32, title: &str, starts_at: DateTime<Utc>) -> Event {
        Event {
            id,
            slug: format!("event-{id}"),
            title: title.to_string(),
            description: None,
            location_name: None,
            image_url: None,
            starts_at,
            ends_at: None,
            status: EventStatus::Published,
        }
    }

    fn service(
        expander: Arc<FixedExpander>,
        source: Arc<RecordingSource>,
    ) -> SuggestionService {
        SuggestionService::new(expander, source, &SuggestionConfig::default())
    }

    #[tokio::test]
    async fn test_short_queries_make_no_calls() {
        let expander = Arc::new(FixedExpander::new(&["coffee"]));
        let source = Arc::new(RecordingSource::default());
        let svc = service(expander.clone(), source.clone());

        for q in ["", " ", "a", "  b  ", "é"] {
            let response = svc.suggest(q).await;
            assert!(response.suggestions.is_empty());
            assert!(response.expanded_terms.is_none());
        }

        assert_eq!(expander.calls.load(Ordering::SeqCst), 0);
        assert!(source.seen_terms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expanded_terms_reach_the_store_and_response() {
        let now = Utc::now();
        let expander = Arc::new(FixedExpander::new(&["coffee", "cà phê"]));
        let source = Arc::new(RecordingSource {
            events: vec![event(1, "Coffee Cupping", now + Duration::days(1))],
            ..Default::default()
        });
        let svc = service(expander, source.clone());

        let response = svc.suggest_at("  coffe ", now).await;

        assert_eq!(
            source.seen_terms.lock().unwrap()[0],
            vec!["coffe", "coffee", "cà phê"]
        );
        assert_eq!(
            response.expanded_terms,
            Some(vec![
                "coffe".to_string(),
                "coffee".to_string(),
                "cà phê".to_string()
            ])
        );
        assert_eq!(response.suggestions.len(), 1);
        assert_eq!(response.suggestions[0].lifecycle, Lifecycle::Upcoming);
    }

    #[tokio::test]
    async fn test_identity_expansion_omits_expanded_terms() {
        let now = Utc::now();
        let expander = Arc::new(FixedExpander::new(&[]));
        let source = Arc::new(RecordingSource {
            events: vec![event(1, "Sunrise Yoga", now - Duration::minutes(5))],
            ..Default::default()
        });
        let svc = service(expander, source);

        let response = svc.suggest_at("yoga", now).await;
        assert!(response.expanded_terms.is_none());
        assert_eq!(response.suggestions[0].lifecycle, Lifecycle::Happening);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("expandedTerms").is_none());
        assert!(json["suggestions"].is_array());
    }

    #[tokio::test]
    async fn test_store_failure_returns_empty_with_terms() {
        let expander = Arc::new(FixedExpander::new(&["coffee"]));
        let source = Arc::new(RecordingSource {
            fail: true,
            ..Default::default()
        });
        let svc = service(expander, source);

        let response = svc.suggest("coffe").await;
        assert!(response.suggestions.is_empty());
        assert_eq!(
            response.expanded_terms,
            Some(vec!["coffe".to_string(), "coffee".to_string()])
        );
    }

    #[tokio::test]
    async fn test_results_are_capped_at_limit() {
        let now = Utc::now();
        let events = (0..10)
            .map(|i| event(i, "Jazz Night", now - Duration::days(i64::from(i))))
            .collect();
        let source = Arc::new(RecordingSource {
            events,
            ..Default::default()
        });
        let svc = service(Arc::new(FixedExpander::new(&[])), source);

        let response = svc.suggest_at("jazz", now).await;
        assert_eq!(response.suggestions.len(), 6);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_idempotent() {
        let now = Utc::now();
        let source = Arc::new(RecordingSource {
            events: vec![
                event(2, "Jazz Brunch", now + Duration::days(2)),
                event(1, "Jazz Night", now - Duration::days(2)),
            ],
            ..Default::default()
        });
        let svc = service(Arc::new(FixedExpander::new(&["blues"])), source);

        let first = svc.suggest_at("jazz", now).await;
        let second = svc.suggest_at("jazz", now).await;
        assert_eq!(first, second);
    }
}
