//! Configuration module for Hark.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    ChunkingSettings, DiarizationSettings, EmbeddingSettings, GeneralSettings,
    GenerationSettings, PromptSettings, RetrievalSettings, Settings, TranscriptionSettings,
    VectorStoreSettings,
};
