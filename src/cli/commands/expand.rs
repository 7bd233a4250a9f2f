use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_expand(config: &Config, query: &str) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        println!("Nothing to expand.");
        return Ok(());
    }

    if !config.expansion.is_active() {
        println!(
            "Expansion is disabled (set {} or expansion.api_key).",
            crate::config::API_KEY_ENV
        );
    }

    let state = SharedState::new(config.clone()).await?;
    let set = state.expander.expand(query).await;

    for (i, term) in set.terms().iter().enumerate() {
        println!("[{}] {}", i + 1, term);
    }

    Ok(())
}
