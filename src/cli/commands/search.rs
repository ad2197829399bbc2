//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top_k: Option<usize>, json: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Search)?;

    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Searching...");
    let hits = orchestrator.retrieve(query, top_k).await;
    spinner.finish_and_clear();

    let hits = match hits {
        Ok(hits) => hits,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        Output::warning("No results found. Use 'hark ingest <file>' to add episodes.");
    } else {
        Output::success(&format!("Found {} results", hits.len()));
        for (i, hit) in hits.iter().enumerate() {
            Output::hit(i + 1, hit);
        }
    }

    Ok(())
}
