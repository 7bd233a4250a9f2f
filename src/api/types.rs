use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Lifecycle;
use crate::models::event::Event;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub lifecycle: Lifecycle,
}

impl EventDto {
    #[must_use]
    pub fn from_event(event: Event, now: DateTime<Utc>) -> Self {
        let lifecycle = event.lifecycle_at(now);
        Self {
            id: event.id,
            slug: event.slug,
            title: event.title,
            description: event.description,
            location: event.location_name,
            image_url: event.image_url,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            lifecycle,
        }
    }
}
