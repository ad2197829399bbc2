//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(inputs: &[String], force: bool, transcript: bool, settings: Settings) -> Result<()> {
    let operation = if transcript {
        Operation::IngestTranscript
    } else {
        Operation::IngestAudio
    };
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings).await?;

    let progress = Output::progress_bar(inputs.len() as u64, "Ingesting");
    let mut indexed = 0usize;
    let mut failures = 0usize;

    for input in inputs {
        let path = Path::new(input);
        progress.set_message(input.clone());

        let result = if transcript {
            orchestrator.ingest_transcript(path, force).await
        } else {
            orchestrator.ingest_file(path, force).await
        };

        progress.inc(1);

        match result {
            Ok(report) if report.skipped => {
                progress.suspend(|| {
                    Output::warning(&format!(
                        "'{}' is already indexed. Use --force to reprocess.",
                        report.title
                    ))
                });
            }
            Ok(report) if report.passages == 0 => {
                progress.suspend(|| {
                    Output::warning(&format!("No speech found in '{}'", report.title))
                });
            }
            Ok(report) => {
                indexed += 1;
                let speakers = if report.has_diarization { ", with speakers" } else { "" };
                progress.suspend(|| {
                    Output::success(&format!(
                        "Indexed '{}' ({} passages{})",
                        report.title, report.passages, speakers
                    ))
                });
            }
            Err(e) => {
                failures += 1;
                progress.suspend(|| Output::error(&format!("Failed to ingest {}: {}", input, e)));
            }
        }
    }

    progress.finish_and_clear();
    Output::kv("Indexed", &indexed.to_string());
    Output::kv("Passages in collection", &orchestrator.passage_count().await.to_string());

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, inputs.len());
    }
    Ok(())
}
