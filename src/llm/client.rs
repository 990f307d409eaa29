//! Generative model client abstraction
//!
//! The analysis runner talks to the chat model only through [`LLMClient`].
//! [`OllamaClient`](crate::llm::ollama::OllamaClient) is the shipped
//! implementation; tests substitute scripted clients.

use crate::types::Result;
use async_trait::async_trait;
use futures::Stream;

/// A finite, single-pass stream of response fragments
pub type FragmentStream = Box<dyn Stream<Item = Result<String>> + Send + Unpin>;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a complete response for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Stream a completion.
    ///
    /// The stream ends when the model signals completion. An `Err` item means
    /// the generation failed mid-stream and no further items follow.
    async fn stream(&self, prompt: &str) -> Result<FragmentStream>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}
