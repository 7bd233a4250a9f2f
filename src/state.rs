use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{QueryExpander, SuggestionService, build_expander};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across services so connections are pooled.
fn build_shared_http_client(timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .user_agent(concat!("eventscout/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub expander: Arc<dyn QueryExpander>,

    pub suggestion_service: Arc<SuggestionService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Wires services over an already connected store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(config.expansion.timeout_ms)?;
        let expander = build_expander(&config.expansion, http_client, store.clone());
        Ok(Self::with_expander(config, store, expander))
    }

    /// Same as [`Self::with_store`] but with a caller-supplied expander.
    #[must_use]
    pub fn with_expander(config: Config, store: Store, expander: Arc<dyn QueryExpander>) -> Self {
        let suggestion_service = Arc::new(SuggestionService::new(
            expander.clone(),
            Arc::new(store.clone()),
            &config.suggestions,
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            expander,
            suggestion_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
