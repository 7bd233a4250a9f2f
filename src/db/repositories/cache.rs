use crate::entities::{expansion_cache, prelude::*};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_expansion(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<String>>> {
        let entry = ExpansionCache::find()
            .filter(expansion_cache::Column::Query.eq(query))
            .filter(expansion_cache::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await?;

        match entry {
            Some(e) => Ok(Some(serde_json::from_str(&e.terms_json)?)),
            None => Ok(None),
        }
    }

    /// Upserts an entry. Expired rows are pruned here rather than on reads,
    /// so lookups stay read-only.
    pub async fn put_expansion(&self, query: &str, terms: &[String], ttl: Duration) -> Result<()> {
        let now = Utc::now();

        ExpansionCache::delete_many()
            .filter(expansion_cache::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await?;

        let active_model = expansion_cache::ActiveModel {
            query: Set(query.to_string()),
            terms_json: Set(serde_json::to_string(terms)?),
            created_at: Set(now),
            expires_at: Set(now + ttl),
            ..Default::default()
        };

        ExpansionCache::insert(active_model)
            .on_conflict(
                OnConflict::column(expansion_cache::Column::Query)
                    .update_columns([
                        expansion_cache::Column::TermsJson,
                        expansion_cache::Column::CreatedAt,
                        expansion_cache::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }
}
