//! Audio splitting with ffmpeg.
//!
//! Long episodes are cut into fixed-length pieces so each transcription
//! request stays under the API's upload limit.

use crate::error::{HarkError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Segments a long audio file into smaller chunks for processing.
///
/// Each chunk will be approximately `chunk_seconds` long. Returns tuples of
/// (chunk_path, offset_seconds) for each segment. Audio no longer than one
/// chunk is returned as-is with offset 0.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds.max(1) as f64;

    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let offsets = segment_offsets(total_duration, chunk_len);
    let mut segments = Vec::with_capacity(offsets.len());

    for (idx, (offset, length)) in offsets.into_iter().enumerate() {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        extract_segment(source, &segment_path, offset, length).await?;

        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push((segment_path, offset));
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Compute (offset, length) pairs covering `total` seconds in `chunk_len` steps.
fn segment_offsets(total: f64, chunk_len: f64) -> Vec<(f64, f64)> {
    let mut offsets = Vec::new();
    let mut offset = 0.0;
    while offset < total {
        offsets.push((offset, chunk_len.min(total - offset)));
        offset += chunk_len;
    }
    offsets
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    // Stream copy first: fast and lossless.
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(HarkError::Audio(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HarkError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(HarkError::Audio(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HarkError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(HarkError::Audio(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(HarkError::Audio("ffprobe returned error".into()));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

/// Extract `format.duration` from ffprobe's JSON output.
fn parse_probe_duration(json_str: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| HarkError::Audio("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| HarkError::Audio("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_offsets_cover_duration() {
        let offsets = segment_offsets(1500.0, 600.0);
        assert_eq!(offsets, vec![(0.0, 600.0), (600.0, 600.0), (1200.0, 300.0)]);
    }

    #[test]
    fn test_parse_probe_duration() {
        let json = r#"{"format": {"filename": "ep.mp3", "duration": "3601.250000"}}"#;
        assert!((parse_probe_duration(json).unwrap() - 3601.25).abs() < 1e-9);
        assert!(parse_probe_duration(r#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration("not json").is_err());
    }
}
