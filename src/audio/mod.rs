//! Audio file utilities: source identification and splitting.

mod split;

pub use split::{probe_duration, split_audio};

use crate::error::{HarkError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Audio file extensions accepted for ingestion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg", "opus", "webm"];

/// Hex SHA-256 of a file's contents, streamed in 8 KiB blocks.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Stable source id for an audio file: `"{file name}-{first 16 hex of sha256}"`.
///
/// Re-ingesting identical bytes yields the same id, so duplicates are detected
/// without trusting the file name alone.
pub fn source_id_for(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| HarkError::InvalidInput(format!("Not a file path: {}", path.display())))?;
    let digest = hash_file(path)?;
    Ok(format!("{}-{}", name, &digest[..16]))
}

/// Whether the path has a supported audio extension.
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("episode.mp3");
        let b = dir.path().join("copy").join("episode.mp3");
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        let id_a = source_id_for(&a).unwrap();
        assert_eq!(id_a, source_id_for(&b).unwrap());
        assert!(id_a.starts_with("episode.mp3-"));
        assert_eq!(id_a.len(), "episode.mp3-".len() + 16);

        std::fs::write(&b, b"other bytes").unwrap();
        assert_ne!(id_a, source_id_for(&b).unwrap());
    }

    #[test]
    fn test_hash_file_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_audio(Path::new("show.MP3")));
        assert!(is_supported_audio(Path::new("a/b/show.m4a")));
        assert!(!is_supported_audio(Path::new("notes.txt")));
        assert!(!is_supported_audio(Path::new("noext")));
    }
}
