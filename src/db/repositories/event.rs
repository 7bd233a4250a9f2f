use crate::entities::{events, prelude::*};
use crate::models::event::{Event, EventStatus, NewEvent};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, LikeExpr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use tracing::{debug, warn};

/// Escape character declared in every `LIKE ... ESCAPE` clause built here.
pub const LIKE_ESCAPE: char = '\\';

/// Lowercased text fields a suggestion term is matched against.
const SEARCH_COLUMNS: [events::Column; 3] = [
    events::Column::TitleFolded,
    events::Column::DescriptionFolded,
    events::Column::LocationFolded,
];

/// Case folding applied to both stored search text and query terms.
///
/// SQLite's `LIKE` only folds ASCII, so `Đà Lạt` would never match
/// `đà lạt` without this.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Builds a `%term%` pattern that matches `term` literally.
///
/// `%` and `_` are wildcards in LIKE and the escape character itself must be
/// escaped too, otherwise `50%` would match "500 people".
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub struct EventRepository {
    conn: DatabaseConnection,
}

impl EventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: events::Model) -> Event {
        let status = model.status.parse().unwrap_or_else(|_| {
            warn!(slug = %model.slug, status = %model.status, "Unknown event status, treating as draft");
            EventStatus::Draft
        });

        Event {
            id: model.id,
            slug: model.slug,
            title: model.title,
            description: model.description,
            location_name: model.location_name,
            image_url: model.image_url,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            status,
        }
    }

    /// Published events whose title, description or location contains any
    /// of `terms` (case-insensitively, Unicode aware), most recent start first.
    pub async fn search_published(&self, terms: &[String], limit: u64) -> Result<Vec<Event>> {
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let mut any_match = Condition::any();
        for term in terms {
            let pattern = contains_pattern(&fold_case(term));
            for column in SEARCH_COLUMNS {
                any_match = any_match.add(
                    Expr::col((Events, column))
                        .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
                );
            }
        }

        let rows = Events::find()
            .filter(events::Column::Status.eq(EventStatus::Published.as_str()))
            .filter(any_match)
            .order_by_desc(events::Column::StartsAt)
            .limit(limit)
            .all(&self.conn)
            .await?;

        debug!(terms = terms.len(), hits = rows.len(), "Event search finished");

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Published events in start order. Events that ended before `now` are
    /// left out unless `include_past` is set.
    pub async fn list_published(
        &self,
        now: DateTime<Utc>,
        include_past: bool,
        limit: u64,
    ) -> Result<Vec<Event>> {
        let mut query =
            Events::find().filter(events::Column::Status.eq(EventStatus::Published.as_str()));

        if !include_past {
            query = query.filter(
                Condition::any()
                    .add(events::Column::EndsAt.is_null())
                    .add(events::Column::EndsAt.gte(now)),
            );
        }

        let rows = query
            .order_by_asc(events::Column::StartsAt)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let row = Events::find()
            .filter(events::Column::Slug.eq(slug))
            .filter(events::Column::Status.eq(EventStatus::Published.as_str()))
            .one(&self.conn)
            .await?;

        Ok(row.map(Self::map_model))
    }

    pub async fn upsert(&self, event: &NewEvent) -> Result<()> {
        let active_model = events::ActiveModel {
            slug: Set(event.slug.clone()),
            title: Set(event.title.clone()),
            description: Set(event.description.clone()),
            location_name: Set(event.location_name.clone()),
            image_url: Set(event.image_url.clone()),
            starts_at: Set(event.starts_at),
            ends_at: Set(event.ends_at),
            status: Set(event.status.as_str().to_string()),
            created_at: Set(Utc::now()),
            title_folded: Set(fold_case(&event.title)),
            description_folded: Set(event.description.as_deref().map(fold_case)),
            location_folded: Set(event.location_name.as_deref().map(fold_case)),
            ..Default::default()
        };

        Events::insert(active_model)
            .on_conflict(
                OnConflict::column(events::Column::Slug)
                    .update_columns([
                        events::Column::Title,
                        events::Column::Description,
                        events::Column::LocationName,
                        events::Column::ImageUrl,
                        events::Column::StartsAt,
                        events::Column::EndsAt,
                        events::Column::Status,
                        events::Column::TitleFolded,
                        events::Column::DescriptionFolded,
                        events::Column::LocationFolded,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }
}
