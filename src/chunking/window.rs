//! Time-windowed passage building.

use super::{Passage, WindowConfig};
use crate::transcription::{Transcript, Word};

/// Sliding-window chunker.
///
/// Emits overlapping passages of `window_seconds`, advancing by
/// `window_seconds - overlap_seconds`. A word joins every window it
/// intersects in time, so speech crossing a boundary appears in both passages.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowChunker {
    config: WindowConfig,
}

impl WindowChunker {
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Build passages from a transcript, preferring word-level timings.
    pub fn chunk_transcript(&self, source_id: &str, transcript: &Transcript) -> Vec<Passage> {
        self.chunk(source_id, &transcript.words())
    }

    /// Build passages from words ordered by start time.
    pub fn chunk(&self, source_id: &str, words: &[Word]) -> Vec<Passage> {
        let Some(first) = words.first() else {
            return Vec::new();
        };

        let t_min = first.start;
        let t_max = words.iter().map(|w| w.end).fold(first.end, f64::max);

        // Every word sits on one instant; a single passage holds them all.
        if t_max <= t_min {
            let text = join_words(words.iter());
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Passage {
                text,
                start: t_min,
                end: t_max,
                source_id: source_id.to_string(),
                sequence_index: 0,
            }];
        }

        let window = self.config.window_seconds();
        let stride = self.config.stride();
        let mut passages = Vec::new();
        let mut index: u64 = 0;
        let mut prev_start = f64::NEG_INFINITY;

        loop {
            let cur_start = t_min + index as f64 * stride;
            if cur_start >= t_max {
                break;
            }

            // Float precision stalled the cursor; the remaining words share one passage.
            if cur_start <= prev_start {
                let text = join_words(words.iter().filter(|w| w.end > prev_start || w.start >= prev_start));
                if !text.is_empty() {
                    passages.push(Passage {
                        text,
                        start: prev_start,
                        end: t_max,
                        source_id: source_id.to_string(),
                        sequence_index: passages.len(),
                    });
                }
                break;
            }

            let cur_end = cur_start + window;
            let text = join_words(words.iter().filter(|w| intersects(w, cur_start, cur_end)));
            if text.is_empty() {
                // No word here reaches later windows, so skip ahead to the next word.
                let Some(next_word) = words.iter().map(|w| w.start).filter(|s| *s >= cur_end).reduce(f64::min) else {
                    break;
                };
                let skip = ((next_word - window - t_min) / stride).floor();
                let target = if skip.is_finite() && skip > 0.0 { skip as u64 } else { 0 };
                index = target.max(index + 1);
            } else {
                passages.push(Passage {
                    text,
                    start: cur_start.max(t_min),
                    end: cur_end.min(t_max),
                    source_id: source_id.to_string(),
                    sequence_index: passages.len(),
                });
                index += 1;
            }

            // This window already holds every word that ends after cur_start.
            if cur_end >= t_max {
                break;
            }
            prev_start = cur_start;
        }

        passages
    }
}

/// Temporal intersection of a word with `[start, end)`.
///
/// Zero-length words count when they sit inside the window, including at its start.
fn intersects(word: &Word, start: f64, end: f64) -> bool {
    word.start < end && (word.end > start || word.start >= start)
}

fn join_words<'a>(words: impl Iterator<Item = &'a Word>) -> String {
    words
        .map(|w| w.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
