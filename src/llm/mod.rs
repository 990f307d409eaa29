//! LLM provider clients
//!
//! - [`LLMClient`] - The trait the analysis runner consumes
//! - [`ollama`] - Local Ollama server: chat streaming plus the connection
//!   helper shared with the embedding adapter
//!
//! # Streaming
//!
//! `stream` returns a [`FragmentStream`], a boxed
//! `Stream<Item = Result<String>>` that yields fragments as the model emits them.

/// Core LLM client trait and streaming response types.
pub mod client;
/// Ollama chat client.
pub mod ollama;

pub use client::{FragmentStream, LLMClient};
pub use ollama::OllamaClient;
