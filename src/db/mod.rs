use crate::models::event::{Event, NewEvent};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::event::contains_pattern;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    pub async fn search_published_events(
        &self,
        terms: &[String],
        limit: u64,
    ) -> Result<Vec<Event>> {
        self.event_repo().search_published(terms, limit).await
    }

    pub async fn list_published_events(
        &self,
        now: DateTime<Utc>,
        include_past: bool,
        limit: u64,
    ) -> Result<Vec<Event>> {
        self.event_repo()
            .list_published(now, include_past, limit)
            .await
    }

    pub async fn get_published_event(&self, slug: &str) -> Result<Option<Event>> {
        self.event_repo().get_published_by_slug(slug).await
    }

    pub async fn upsert_event(&self, event: &NewEvent) -> Result<()> {
        self.event_repo().upsert(event).await
    }

    pub async fn get_cached_expansion(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<String>>> {
        self.cache_repo().get_expansion(query, now).await
    }

    pub async fn cache_expansion(
        &self,
        query: &str,
        terms: &[String],
        ttl: chrono::Duration,
    ) -> Result<()> {
        self.cache_repo().put_expansion(query, terms, ttl).await
    }
}
