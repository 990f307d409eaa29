//! Embedding providers.
//!
//! The retrieval core only sees [`EmbeddingProvider`]; [`OllamaEmbedder`] is the
//! shipped adapter for a local Ollama server.

use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
};

use crate::llm::ollama::connect;
use crate::types::{AppError, Result};

/// Default embedding model served by Ollama
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Turns text into a fixed-length vector.
///
/// Implementations should be deterministic enough within a session for the
/// embedding cache to be meaningful.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = connect(base_url).map_err(AppError::EmbeddingProvider)?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(
            self.model.clone(),
            EmbeddingsInput::Single(text.to_string()),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::EmbeddingProvider(format!("Ollama error: {}", e)))?;

        match response.embeddings.into_iter().next() {
            Some(embedding) if !embedding.is_empty() => Ok(embedding),
            _ => Err(AppError::EmbeddingProvider(format!(
                "Malformed response from '{}': no embedding returned",
                self.model
            ))),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
