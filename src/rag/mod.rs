//! Retrieval Augmented Generation (RAG) core
//!
//! The retrieval half of an analysis run:
//!
//! - [`rag::chunker`](crate::rag::chunker) - Overlapping character windows over documents
//! - [`rag::embeddings`](crate::rag::embeddings) - Embedding provider trait and Ollama adapter
//! - [`rag::cache`](crate::rag::cache) - Session-scoped embedding cache
//! - [`rag::search`](crate::rag::search) - Cosine similarity, ranking and top-k retrieval
//! - [`rag::context`](crate::rag::context) - Context block assembly
//!
//! # Pipeline
//!
//! 1. **Chunking** - Each document is split once per session
//! 2. **Embedding** - Chunks are embedded lazily, the first time they are scored
//! 3. **Retrieval** - The query is embedded and every chunk scored by linear scan
//! 4. **Context** - The top-k chunks are labelled by document and joined
//!
//! # Example
//!
//! ```ignore
//! use lexa::rag::{chunker::TextChunker, cache::SessionEmbeddingCache, search::SemanticRetriever};
//!
//! let chunker = TextChunker::new(2000, 200)?;
//! let chunks = chunker.chunk_document(&document);
//!
//! let mut cache = SessionEmbeddingCache::new();
//! let retriever = SemanticRetriever::new(&embedder, 3, Duration::from_secs(120));
//! let top = retriever.retrieve("What are the payment terms?", &chunks, &mut cache).await?;
//! let context = lexa::rag::context::assemble(&top);
//! ```

pub mod cache;
pub mod chunker;
pub mod context;
pub mod embeddings;
pub mod search;
