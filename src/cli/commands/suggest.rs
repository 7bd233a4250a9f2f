use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_suggest(config: &Config, query: &str, json: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let response = state.suggestion_service.suggest(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if let Some(terms) = &response.expanded_terms {
        println!("Expanded: {}", terms.join(" | "));
    }

    if response.suggestions.is_empty() {
        println!("No events found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("{:<10} {:<25} {}", "STATUS", "STARTS", "TITLE");
    println!("{:-<70}", "");

    for s in &response.suggestions {
        println!(
            "{:<10} {:<25} {}",
            s.lifecycle,
            s.starts_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            s.title
        );
        if let Some(location) = &s.location {
            println!("{:<36} @ {location}", "");
        }
    }

    Ok(())
}
