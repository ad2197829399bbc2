//! Passage construction from time-aligned words.
//!
//! Passages are overlapping fixed-duration windows over a source's words; they
//! are the retrieval unit for both the lexical and the vector index.

mod window;

pub use window::WindowChunker;

use crate::error::{HarkError, Result};
use serde::{Deserialize, Serialize};

/// A contiguous, possibly overlapping window of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Space-joined text of the words intersecting the window.
    pub text: String,
    /// Start time in seconds, clamped to the first word.
    pub start: f64,
    /// End time in seconds, clamped to the last word.
    pub end: f64,
    /// Source (episode) this passage belongs to.
    pub source_id: String,
    /// 0-based position among the source's passages.
    pub sequence_index: usize,
}

impl Passage {
    /// Composite identifier `"{source_id}:{sequence_index}"`.
    pub fn id(&self) -> String {
        passage_id(&self.source_id, self.sequence_index)
    }

    /// Duration of this passage in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Build the public passage identifier.
pub fn passage_id(source_id: &str, sequence_index: usize) -> String {
    format!("{}:{}", source_id, sequence_index)
}

/// Split a passage identifier back into source id and sequence index.
///
/// Splits on the last `:` so source ids may themselves contain colons.
pub fn parse_passage_id(id: &str) -> Option<(&str, usize)> {
    let (source_id, index) = id.rsplit_once(':')?;
    Some((source_id, index.parse().ok()?))
}

/// Smallest distance the window cursor may advance, in seconds.
pub const MIN_STRIDE_SECONDS: f64 = 0.01;

/// Validated sliding-window parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    window_seconds: f64,
    overlap_seconds: f64,
}

impl WindowConfig {
    /// Validate window parameters.
    ///
    /// Requires a finite `window_seconds > 0`, `0 <= overlap_seconds < window_seconds`
    /// and a stride of at least [`MIN_STRIDE_SECONDS`].
    pub fn new(window_seconds: f64, overlap_seconds: f64) -> Result<Self> {
        if !window_seconds.is_finite() || window_seconds <= 0.0 {
            return Err(HarkError::Config(format!(
                "window_seconds must be a positive number, got {}",
                window_seconds
            )));
        }
        if !overlap_seconds.is_finite() || overlap_seconds < 0.0 || overlap_seconds >= window_seconds {
            return Err(HarkError::Config(format!(
                "overlap_seconds must be in [0, {}), got {}",
                window_seconds, overlap_seconds
            )));
        }

        if window_seconds - overlap_seconds < MIN_STRIDE_SECONDS {
            return Err(HarkError::Config(format!(
                "window_seconds - overlap_seconds must be at least {}s, got {}",
                MIN_STRIDE_SECONDS,
                window_seconds - overlap_seconds
            )));
        }

        Ok(Self {
            window_seconds,
            overlap_seconds,
        })
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_seconds
    }

    pub fn overlap_seconds(&self) -> f64 {
        self.overlap_seconds
    }

    /// Distance the cursor advances between windows.
    pub fn stride(&self) -> f64 {
        self.window_seconds - self.overlap_seconds
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_seconds: 45.0,
            overlap_seconds: 7.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_config_validation() {
        assert!(WindowConfig::new(5.0, 1.0).is_ok());
        assert!(WindowConfig::new(5.0, 0.0).is_ok());
        assert!(WindowConfig::new(0.0, 0.0).is_err());
        assert!(WindowConfig::new(-1.0, 0.0).is_err());
        assert!(WindowConfig::new(5.0, 5.0).is_err());
        assert!(WindowConfig::new(5.0, 7.0).is_err());
        assert!(WindowConfig::new(5.0, -0.5).is_err());
        assert!(WindowConfig::new(f64::INFINITY, 1.0).is_err());
        assert!(WindowConfig::new(5.0, f64::NAN).is_err());
        assert!(WindowConfig::new(1e-13, 0.0).is_err());
        assert!(WindowConfig::new(5.0, 4.999).is_err());
        assert_eq!(WindowConfig::new(5.0, 1.0).unwrap().stride(), 4.0);
    }

    #[test]
    fn test_passage_id_round_trip() {
        let passage = Passage {
            text: "hello".to_string(),
            start: 0.0,
            end: 1.0,
            source_id: "ep:1.mp3-abc".to_string(),
            sequence_index: 12,
        };
        assert_eq!(passage.id(), "ep:1.mp3-abc:12");
        assert_eq!(parse_passage_id(&passage.id()), Some(("ep:1.mp3-abc", 12)));
        assert_eq!(parse_passage_id("no-index"), None);
        assert_eq!(parse_passage_id("src:x"), None);
    }
}
