use anyhow::Context;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::models::event::NewEvent;

pub async fn cmd_import(config: &Config, path: &str) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(Path::new(path))
        .await
        .with_context(|| format!("Failed to read {path}"))?;

    let events: Vec<NewEvent> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {path}"))?;

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let mut imported = 0;
    let mut skipped = 0;

    for event in &events {
        if event.slug.trim().is_empty() || event.title.trim().is_empty() {
            println!("  ✗ Skipping event without slug or title");
            skipped += 1;
            continue;
        }

        store
            .upsert_event(event)
            .await
            .with_context(|| format!("Failed to import '{}'", event.slug))?;
        imported += 1;
    }

    info!(imported, skipped, "Event import finished");
    println!("✓ Imported {imported} event(s), skipped {skipped}");

    Ok(())
}
