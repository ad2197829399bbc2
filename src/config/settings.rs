//! Configuration settings for Hark.

use crate::chunking::WindowConfig;
use crate::error::{HarkError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub diarization: DiarizationSettings,
    pub generation: GenerationSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.hark".to_string(),
            temp_dir: "/tmp/hark".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language hint (ISO-639-1). Detected automatically when unset.
    pub language: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Passage windowing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Passage window length in seconds.
    pub window_seconds: f64,
    /// Overlap between consecutive windows in seconds.
    pub overlap_seconds: f64,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            window_seconds: 45.0,
            overlap_seconds: 7.0,
        }
    }
}

impl ChunkingSettings {
    /// Validate into a window configuration.
    pub fn window(&self) -> Result<WindowConfig> {
        WindowConfig::new(self.window_seconds, self.overlap_seconds)
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Named collection that scopes every read and write.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.hark/vectors.db".to_string(),
            collection: "podcasts".to_string(),
        }
    }
}

/// Hybrid retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Default number of hits returned.
    pub top_k: usize,
    /// Reciprocal rank fusion smoothing constant.
    pub rrf_k: u32,
    /// Vector over-fetch factor relative to `top_k`.
    pub candidate_multiplier: usize,
    /// BM25 term-frequency saturation.
    pub bm25_k1: f64,
    /// BM25 length normalization.
    pub bm25_b: f64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 8,
            rrf_k: 60,
            candidate_multiplier: 3,
            bm25_k1: 1.5,
            bm25_b: 0.75,
        }
    }
}

/// Speaker diarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DiarizationSettings {
    /// Annotate passages with speakers when RTTM turns are available.
    pub enabled: bool,
    /// Directory holding `<audio stem>.rttm` files. Defaults to the audio file's directory.
    pub rttm_dir: Option<String>,
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Call language model providers. When false only the extractive summary is produced.
    pub enabled: bool,
    /// Model used with `GROQ_API_KEY`.
    pub groq_model: String,
    /// Base URL of the Groq OpenAI-compatible API.
    pub groq_api_base: String,
    /// Model used with `OPENAI_API_KEY`.
    pub openai_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of hits placed in the prompt.
    pub max_context_hits: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            groq_model: "llama-3.1-8b-instant".to_string(),
            groq_api_base: "https://api.groq.com/openai/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_context_hits: 10,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make retrieval misbehave.
    pub fn validate(&self) -> Result<()> {
        self.chunking.window()?;

        if self.retrieval.top_k == 0 {
            return Err(HarkError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.retrieval.candidate_multiplier == 0 {
            return Err(HarkError::Config(
                "retrieval.candidate_multiplier must be at least 1".to_string(),
            ));
        }
        if !self.retrieval.bm25_k1.is_finite() || self.retrieval.bm25_k1 < 0.0 {
            return Err(HarkError::Config(format!(
                "retrieval.bm25_k1 must be a non-negative number, got {}",
                self.retrieval.bm25_k1
            )));
        }
        if !(0.0..=1.0).contains(&self.retrieval.bm25_b) {
            return Err(HarkError::Config(format!(
                "retrieval.bm25_b must be in [0, 1], got {}",
                self.retrieval.bm25_b
            )));
        }
        if self.vector_store.collection.trim().is_empty() {
            return Err(HarkError::Config("vector_store.collection must not be empty".to_string()));
        }

        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| HarkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hark")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}
