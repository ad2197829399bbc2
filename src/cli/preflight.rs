//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::error::{HarkError, Result};
use crate::openai::env_key;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Audio ingestion needs ffmpeg tools and an API key.
    IngestAudio,
    /// Transcript ingestion only needs embeddings.
    IngestTranscript,
    /// Search degrades to lexical ranking without an API key.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::IngestAudio => {
            check_api_key()?;
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::IngestTranscript => {
            check_api_key()?;
        }
        Operation::Search => {}
    }
    Ok(())
}

fn check_api_key() -> Result<()> {
    match env_key("OPENAI_API_KEY") {
        Some(_) => Ok(()),
        None => Err(HarkError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(HarkError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HarkError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(HarkError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_search_no_requirements() {
        assert!(check(Operation::Search).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("hark-definitely-not-installed"),
            Err(HarkError::ToolNotFound(_))
        ));
    }
}
