//! OpenAI Whisper transcription with word-level timestamps.

use super::{Transcriber, Transcript, TranscriptSegment, WordTiming};
use crate::audio::split_audio;
use crate::config::TranscriptionSettings;
use crate::error::{HarkError, Result};
use crate::openai::create_client;
use async_openai::types::{
    AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs, TimestampGranularity,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
    work_dir: Option<PathBuf>,
}

impl WhisperTranscriber {
    /// Create a transcriber from settings.
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            language: settings.language.clone(),
            chunk_duration_seconds: settings.chunk_duration_seconds,
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
            work_dir: None,
        })
    }

    /// Place split audio segments under `dir` instead of the system temp directory.
    pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Transcript> {
        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .timestamp_granularities(vec![TimestampGranularity::Word, TimestampGranularity::Segment]);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| HarkError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| HarkError::OpenAI(format!("Whisper API error: {}", e)))?;

        let words: Vec<WordTiming> = response
            .words
            .unwrap_or_default()
            .into_iter()
            .map(|w| WordTiming {
                word: w.word,
                start: w.start as f64,
                end: w.end as f64,
            })
            .collect();

        let spans: Vec<(f64, f64, String)> = response
            .segments
            .map(|segs| {
                segs.into_iter()
                    .map(|s| (s.start as f64, s.end as f64, s.text.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        if words.is_empty() && !spans.is_empty() {
            warn!("No word-level timestamps returned, falling back to segment-level");
        }

        let segments = if spans.is_empty() {
            vec![TranscriptSegment::with_words(
                0.0,
                response.duration as f64,
                response.text.trim(),
                words,
            )]
        } else {
            attach_words(spans, words)
        };

        debug!("Transcribed {} segments", segments.len());

        let mut transcript = Transcript::new(segments);
        transcript.language = Some(response.language);
        Ok(transcript)
    }

    /// Transcribe an audio file, splitting if necessary.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_with_splitting(&self, audio_path: &Path) -> Result<Transcript> {
        let temp_dir = match &self.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                tempfile::tempdir_in(dir)?
            }
            None => tempfile::tempdir()?,
        };
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if chunks.len() == 1 {
            return self.transcribe_single(audio_path).await;
        }

        let chunk_count = chunks.len();
        info!("Processing {} audio chunks with {}", chunk_count, self.model);

        let mut results: Vec<(usize, f64, Transcript)> = Vec::with_capacity(chunk_count);

        let mut stream = stream::iter(chunks.into_iter().enumerate())
            .map(|(idx, (chunk_path, time_offset))| async move {
                let result = self.transcribe_single(&chunk_path).await;
                (idx, time_offset, result)
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, time_offset, result)) = stream.next().await {
            match result {
                Ok(transcript) => results.push((idx, time_offset, transcript)),
                Err(e) => {
                    return Err(HarkError::Transcription(format!(
                        "Chunk {} at {:.0}s failed: {}",
                        idx, time_offset, e
                    )));
                }
            }
        }

        results.sort_by_key(|(idx, _, _)| *idx);

        let mut language = None;
        let mut all_segments = Vec::new();
        for (_, time_offset, transcript) in results {
            language = language.or(transcript.language);
            for mut segment in transcript.segments {
                segment.start += time_offset;
                segment.end += time_offset;
                if let Some(words) = segment.words.as_mut() {
                    for word in words {
                        word.start += time_offset;
                        word.end += time_offset;
                    }
                }
                all_segments.push(segment);
            }
        }

        let mut transcript = Transcript::new(all_segments);
        transcript.language = language;
        Ok(transcript)
    }
}

/// Distribute time-ordered words over time-ordered segments.
///
/// A word belongs to the first segment whose end lies after the word's start;
/// words past the last segment end are attached to the last segment.
fn attach_words(spans: Vec<(f64, f64, String)>, words: Vec<WordTiming>) -> Vec<TranscriptSegment> {
    let span_count = spans.len();
    let mut words = words.into_iter().peekable();

    spans
        .into_iter()
        .enumerate()
        .map(|(i, (start, end, text))| {
            let is_last = i + 1 == span_count;
            let mut owned = Vec::new();
            while let Some(word) = words.next_if(|w| is_last || w.start < end) {
                owned.push(word);
            }
            TranscriptSegment::with_words(start, end, text, owned)
        })
        .collect()
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(word: &str, start: f64, end: f64) -> WordTiming {
        WordTiming {
            word: word.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_attach_words_by_segment_end() {
        let spans = vec![
            (0.0, 2.0, "one two".to_string()),
            (2.0, 4.0, "three".to_string()),
        ];
        let words = vec![
            timing("one", 0.0, 0.9),
            timing("two", 1.0, 1.9),
            timing("three", 2.1, 3.0),
            timing("late", 4.2, 4.5),
        ];

        let segments = attach_words(spans, words);
        let counts: Vec<usize> = segments
            .iter()
            .map(|s| s.words.as_ref().map_or(0, Vec::len))
            .collect();
        assert_eq!(counts, vec![2, 2]);
    }

    #[test]
    fn test_attach_words_without_words_keeps_segments() {
        let segments = attach_words(vec![(0.0, 1.0, "solo".to_string())], Vec::new());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "solo");
    }
}
