//! Speaker diarization input.
//!
//! Speaker turns only annotate passage metadata; they never influence
//! windowing or ranking. Turns are read from RTTM files produced by an
//! external diarization tool.

use crate::config::DiarizationSettings;
use crate::error::{HarkError, Result};
use crate::vector_store::PassageMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A span of audio attributed to one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTurn {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

/// Trait for diarization collaborators.
#[async_trait]
pub trait Diarizer: Send + Sync {
    /// Speaker turns for an audio file, ordered by start time.
    async fn diarize(&self, audio_path: &Path) -> Result<Vec<SpeakerTurn>>;
}

/// Reads `<audio stem>.rttm` from a configured directory, or next to the audio.
pub struct RttmDiarizer {
    rttm_dir: Option<PathBuf>,
}

impl RttmDiarizer {
    pub fn new(rttm_dir: Option<PathBuf>) -> Self {
        Self { rttm_dir }
    }

    /// Build from settings; `None` when diarization is disabled.
    pub fn from_settings(settings: &DiarizationSettings) -> Option<Self> {
        settings.enabled.then(|| {
            Self::new(
                settings
                    .rttm_dir
                    .as_deref()
                    .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref())),
            )
        })
    }

    /// Where the RTTM file for `audio_path` is expected.
    pub fn rttm_path(&self, audio_path: &Path) -> PathBuf {
        let file_name = audio_path.with_extension("rttm");
        match &self.rttm_dir {
            Some(dir) => dir.join(file_name.file_name().unwrap_or_default()),
            None => file_name,
        }
    }
}

#[async_trait]
impl Diarizer for RttmDiarizer {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn diarize(&self, audio_path: &Path) -> Result<Vec<SpeakerTurn>> {
        let path = self.rttm_path(audio_path);
        if !path.exists() {
            return Err(HarkError::Diarization(format!(
                "No RTTM file at {}",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let turns = parse_rttm(&content);
        debug!("Read {} speaker turns from {}", turns.len(), path.display());
        Ok(turns)
    }
}

/// Parse RTTM `SPEAKER` lines into turns sorted by start time.
///
/// Fields: `SPEAKER <file> <chan> <onset> <duration> <ortho> <stype> <name> ...`.
/// Malformed lines are skipped.
pub fn parse_rttm(content: &str) -> Vec<SpeakerTurn> {
    let mut turns: Vec<SpeakerTurn> = content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 || fields[0] != "SPEAKER" {
                return None;
            }
            let onset: f64 = fields[3].parse().ok()?;
            let duration: f64 = fields[4].parse().ok()?;
            if !onset.is_finite() || !duration.is_finite() || duration < 0.0 {
                return None;
            }
            Some(SpeakerTurn {
                start: onset,
                end: onset + duration,
                speaker: fields[7].to_string(),
            })
        })
        .collect();

    turns.sort_by(|a, b| a.start.total_cmp(&b.start));
    turns
}

/// Distinct speakers overlapping `[start, end)`, in order of first appearance.
pub fn speakers_between(turns: &[SpeakerTurn], start: f64, end: f64) -> Vec<String> {
    let mut speakers: Vec<String> = Vec::new();
    for turn in turns {
        let overlaps = turn.start < end && turn.end > start;
        if overlaps && !speakers.contains(&turn.speaker) {
            speakers.push(turn.speaker.clone());
        }
    }
    speakers
}

/// Attach speaker information to passage metadata.
pub fn annotate(metadata: &mut PassageMetadata, turns: Option<&[SpeakerTurn]>) {
    let Some(turns) = turns.filter(|t| !t.is_empty()) else {
        return;
    };
    metadata.has_diarization = true;
    metadata.speakers = speakers_between(turns, metadata.start, metadata.end);
}
