//! # lexa - Legal Document Analysis
//!
//! Retrieval-augmented analysis of contracts and correspondence, run against a
//! local Ollama server.
//!
//! Documents are split into overlapping character windows, each window is
//! embedded once per session, and for every query the most similar windows are
//! handed to a chat model together with the query and a fixed analysis
//! template. The answer is streamed to the terminal and appended to a markdown
//! file for the session.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use lexa::{LexaConfig, Session};
//! use lexa::session::SessionObserver;
//! use lexa::analysis::AnalysisObserver;
//!
//! struct Print;
//! impl AnalysisObserver for Print {
//!     fn on_fragment(&mut self, fragment: &str) {
//!         print!("{fragment}");
//!     }
//! }
//! impl SessionObserver for Print {}
//!
//! let config = LexaConfig::load("lexa.toml")?;
//! let queries = config.query_plan(&[]);
//! let mut session = Session::from_config(config, std::path::Path::new("."))?;
//! let report = session.run(&queries, &mut Print).await?;
//! println!("{} completed, {} failed", report.completed(), report.failed());
//! ```
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embeddings, the session cache and similarity search
//! - [`analysis`] - Prompt construction and the per-query runner
//! - [`llm`] - Chat model clients
//! - [`session`] - Document loading, orchestration and output
//! - [`cli`] - Command line parsing and terminal output
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

/// Prompt construction and the per-query analysis runner.
pub mod analysis;
/// Command line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Session orchestration, document sources and output sinks.
pub mod session;
/// Core types and errors.
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use analysis::{AnalysisObserver, AnalysisRunner, PromptBuilder};
pub use llm::{LLMClient, OllamaClient};
pub use rag::cache::SessionEmbeddingCache;
pub use rag::chunker::TextChunker;
pub use rag::embeddings::{EmbeddingProvider, OllamaEmbedder};
pub use session::{Session, SessionObserver, SessionReport};
pub use types::{AppError, Result};
pub use utils::toml_config::LexaConfig;
