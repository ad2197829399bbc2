//! Transcription collaborator for Hark.
//!
//! Speech-to-text is treated as a black box that produces time-aligned
//! segments. Whatever shape the engine emits is normalized here, once, into
//! [`Word`]s for the passage builder.

mod models;
mod whisper;

pub use models::{format_timestamp, Transcript, TranscriptSegment, Word, WordTiming};
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}

/// Load a pre-transcribed JSON transcript from disk.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let content = std::fs::read_to_string(path)?;
    Transcript::from_json(&content)
}
