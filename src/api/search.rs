use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::AppState;
use crate::services::SuggestionResponse;

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /search/suggestions?q=`
///
/// Best-effort type-ahead endpoint: always `200`, with an empty list when the
/// query is too short or the store is unavailable.
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SuggestionQuery>, QueryRejection>,
) -> Json<SuggestionResponse> {
    let query = query.map_or_else(
        |rejection| {
            debug!(error = %rejection, "Malformed suggestion query string");
            SuggestionQuery::default()
        },
        |Query(q)| q,
    );
    Json(state.suggestion_service().suggest(&query.q).await)
}
