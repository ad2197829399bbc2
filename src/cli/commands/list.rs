//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;

    match orchestrator.list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No episodes indexed yet. Use 'hark ingest <file>' to add content.");
            } else {
                Output::header(&format!(
                    "Indexed Sources in '{}' ({})",
                    orchestrator.collection(),
                    sources.len()
                ));
                println!();

                for source in &sources {
                    Output::source_info(source);
                }

                let total_passages: u32 = sources.iter().map(|s| s.passage_count).sum();
                println!();
                Output::kv("Total sources", &sources.len().to_string());
                Output::kv("Total passages", &total_passages.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sources: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
