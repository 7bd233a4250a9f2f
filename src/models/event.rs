use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{Lifecycle, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Cancelled,
}

impl EventStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "cancelled" => Ok(Self::Cancelled),
            other => anyhow::bail!("Unknown event status: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub location_name: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: EventStatus,
}

impl Event {
    #[must_use]
    pub fn lifecycle_at(&self, now: DateTime<Utc>) -> Lifecycle {
        classify(now, self.starts_at, self.ends_at)
    }
}

/// Event as accepted by the importer; the slug is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: EventStatus,
}

/// Lightweight projection of an event for the type-ahead dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSuggestion {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl EventSuggestion {
    #[must_use]
    pub fn from_event(event: Event, now: DateTime<Utc>) -> Self {
        let lifecycle = event.lifecycle_at(now);
        Self {
            id: event.id,
            slug: event.slug,
            title: event.title,
            location: event.location_name,
            image_url: event.image_url,
            starts_at: event.starts_at,
            lifecycle,
        }
    }
}
