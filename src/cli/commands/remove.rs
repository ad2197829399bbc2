//! Remove command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::HarkError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the remove command.
pub async fn run_remove(source_id: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;

    match orchestrator.remove_source(source_id).await {
        Ok(deleted) => {
            Output::success(&format!("Removed {} ({} passages)", source_id, deleted));
            Ok(())
        }
        Err(HarkError::SourceNotFound(_)) => {
            Output::error(&format!("No indexed source '{}'. See 'hark list'.", source_id));
            anyhow::bail!("source not found: {}", source_id)
        }
        Err(e) => {
            Output::error(&format!("Failed to remove {}: {}", source_id, e));
            Err(e.into())
        }
    }
}
