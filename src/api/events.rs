use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, EventDto};

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub limit: Option<u64>,
    #[serde(default)]
    pub include_past: bool,
}

/// `GET /api/events`
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEventsQuery>,
) -> Result<Json<ApiResponse<Vec<EventDto>>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 || limit > MAX_LIST_LIMIT {
        return Err(ApiError::validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }

    let now = Utc::now();
    let events = state
        .store()
        .list_published_events(now, params.include_past, limit)
        .await
        .map_err(ApiError::database)?;

    let dtos = events
        .into_iter()
        .map(|event| EventDto::from_event(event, now))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// `GET /api/events/{slug}`
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<EventDto>>, ApiError> {
    let event = state
        .store()
        .get_published_event(&slug)
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::event_not_found(&slug))?;

    Ok(Json(ApiResponse::success(EventDto::from_event(
        event,
        Utc::now(),
    ))))
}
