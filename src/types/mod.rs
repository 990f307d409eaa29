use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::toml_config::ConfigError;

// ============= Document Types =============

/// A loaded source document. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A configured document to be loaded at session start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    /// Label used in retrieved context and cache keys (e.g. "MSA")
    pub name: String,
    /// Path to the document, relative paths resolve against the config file
    pub path: String,
}

// ============= RAG Types =============

/// A window of a document's text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub document: String,
    pub index: usize,
    pub text: String,
}

impl Chunk {
    /// Stable embedding cache key: `"{document}_{index}"`
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.document, self.index)
    }
}

/// A chunk scored against one query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub score: f32,
    pub document: String,
    pub index: usize,
    pub text: String,
}

// ============= Analysis Types =============

/// The full response generated for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub query: String,
    pub response: String,
}

/// Lifecycle of a single query through the analysis runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryState {
    Pending,
    Retrieving,
    Prompting,
    Generating,
    Complete,
    Failed,
}

impl QueryState {
    /// Whether the runner may move from `self` to `next`.
    ///
    /// The happy path is strictly linear; any non-terminal state may fail.
    pub fn can_transition_to(self, next: QueryState) -> bool {
        use QueryState::*;
        match (self, next) {
            (Pending, Retrieving)
            | (Retrieving, Prompting)
            | (Prompting, Generating)
            | (Generating, Complete) => true,
            (Pending | Retrieving | Prompting | Generating, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QueryState::Complete | QueryState::Failed)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryState::Pending => "pending",
            QueryState::Retrieving => "retrieving",
            QueryState::Prompting => "prompting",
            QueryState::Generating => "generating",
            QueryState::Complete => "complete",
            QueryState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Document not found: {name} ({path})")]
    DocumentNotFound { name: String, path: String },

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Generation provider error: {0}")]
    GenerationProvider(String),

    #[error("Degenerate vector for '{0}': zero norm, similarity undefined")]
    DegenerateVector(String),

    #[error("Dimension mismatch for '{key}': query has {expected} dimensions, chunk has {actual}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Invalid chunking parameters: chunk_size ({chunk_size}) must be greater than overlap ({overlap})"
    )]
    InvalidChunkingParameters { chunk_size: usize, overlap: usize },

    #[error("No documents could be loaded")]
    NoDocuments,

    #[error("Output error: {0}")]
    Output(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
