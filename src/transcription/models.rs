//! Data models for transcription.

use crate::error::{HarkError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single word with timing, normalized for passage building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The word text, trimmed.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Word-level timing as emitted by speech-to-text engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordTiming {
    /// The word text (may carry leading whitespace).
    #[serde(alias = "text")]
    pub word: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    #[serde(alias = "start_seconds")]
    pub start: f64,
    /// End time in seconds.
    #[serde(alias = "end_seconds")]
    pub end: f64,
    /// Transcribed text content.
    pub text: String,
    /// Word-level timings, when the engine produced them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordTiming>>,
}

impl TranscriptSegment {
    /// Create a segment without word-level timings.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: None,
        }
    }

    /// Create a segment carrying word-level timings.
    pub fn with_words(start: f64, end: f64, text: impl Into<String>, words: Vec<WordTiming>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: Some(words),
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A complete transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Detected or hinted language.
    #[serde(default)]
    pub language: Option<String>,
    /// Total duration in seconds.
    #[serde(default)]
    pub duration_seconds: f64,
    /// Transcript segments in time order.
    pub segments: Vec<TranscriptSegment>,
}

/// Accepted JSON layouts for pre-transcribed input.
#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptJson {
    Full(Transcript),
    Segments(Vec<TranscriptSegment>),
}

impl Transcript {
    /// Create a transcript from segments.
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        let duration_seconds = segments.iter().map(|s| s.end).fold(0.0, f64::max);
        Self {
            language: None,
            duration_seconds,
            segments,
        }
    }

    /// Parse a transcript from JSON: either a transcript object or a bare segment array.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: TranscriptJson = serde_json::from_str(json)
            .map_err(|e| HarkError::InvalidInput(format!("Unrecognized transcript JSON: {}", e)))?;

        Ok(match parsed {
            TranscriptJson::Full(mut transcript) => {
                if transcript.duration_seconds <= 0.0 {
                    transcript.duration_seconds =
                        transcript.segments.iter().map(|s| s.end).fold(0.0, f64::max);
                }
                transcript
            }
            TranscriptJson::Segments(segments) => Transcript::new(segments),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Full transcript text.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flatten the transcript into time-ordered words.
    ///
    /// Word-level timings are used when a segment has them; otherwise the whole
    /// segment becomes one word. Entries with empty text, non-finite times or
    /// `end < start` are dropped.
    pub fn words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        let mut dropped = 0usize;

        for segment in &self.segments {
            let candidates: Vec<(&str, f64, f64)> = match &segment.words {
                Some(timings) if !timings.is_empty() => timings
                    .iter()
                    .map(|w| (w.word.as_str(), w.start, w.end))
                    .collect(),
                _ => vec![(segment.text.as_str(), segment.start, segment.end)],
            };

            for (text, start, end) in candidates {
                let text = text.trim();
                if text.is_empty() || !start.is_finite() || !end.is_finite() || end < start {
                    dropped += 1;
                    continue;
                }
                words.push(Word::new(text, start, end));
            }
        }

        if dropped > 0 {
            debug!("Dropped {} malformed word entries", dropped);
        }

        // Stable, so engines that emit equal starts keep their order.
        words.sort_by(|a, b| a.start.total_cmp(&b.start));
        words
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
        assert_eq!(format_timestamp(-3.0), "00:00");
    }

    #[test]
    fn test_prefers_word_level_timings() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::with_words(
                0.0,
                2.0,
                " hello world",
                vec![
                    WordTiming { word: " hello".to_string(), start: 0.0, end: 0.8 },
                    WordTiming { word: " world".to_string(), start: 0.9, end: 2.0 },
                ],
            ),
            TranscriptSegment::new(2.0, 4.0, " a flat segment "),
        ]);

        let words = transcript.words();
        assert_eq!(
            words,
            vec![
                Word::new("hello", 0.0, 0.8),
                Word::new("world", 0.9, 2.0),
                Word::new("a flat segment", 2.0, 4.0),
            ]
        );
    }

    #[test]
    fn test_drops_malformed_entries() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new(0.0, 1.0, "   "),
            TranscriptSegment::new(3.0, 2.0, "backwards"),
            TranscriptSegment::new(f64::NAN, 2.0, "nan"),
            TranscriptSegment::new(4.0, 5.0, "kept"),
        ]);

        assert_eq!(transcript.words(), vec![Word::new("kept", 4.0, 5.0)]);
    }

    #[test]
    fn test_from_json_accepts_both_shapes() {
        let object = r#"{
            "language": "en",
            "segments": [
                {"start": 0.0, "end": 1.5, "text": "hi there",
                 "words": [{"word": "hi", "start": 0.0, "end": 0.5},
                           {"word": "there", "start": 0.6, "end": 1.5}]}
            ]
        }"#;
        let transcript = Transcript::from_json(object).unwrap();
        assert_eq!(transcript.language.as_deref(), Some("en"));
        assert_eq!(transcript.duration_seconds, 1.5);
        assert_eq!(transcript.words().len(), 2);

        let array = r#"[
            {"start_seconds": 0.0, "end_seconds": 5.0, "text": "first"},
            {"start": 5.0, "end": 9.0, "text": "second", "words": null}
        ]"#;
        let transcript = Transcript::from_json(array).unwrap();
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.full_text(), "first second");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Transcript::from_json("{\"nope\": 1}"),
            Err(HarkError::InvalidInput(_))
        ));
    }
}
