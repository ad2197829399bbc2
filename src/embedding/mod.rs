//! Embedding generation for the vector ranker.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::config::EmbeddingSettings;
use crate::error::{HarkError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Build the configured embedder.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIEmbedder::from_settings(settings)?)),
        other => Err(HarkError::Config(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_rejected() {
        let settings = EmbeddingSettings {
            provider: "carrier-pigeon".to_string(),
            ..EmbeddingSettings::default()
        };
        assert!(matches!(create_embedder(&settings), Err(HarkError::Config(_))));
    }
}
