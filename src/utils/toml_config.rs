//! TOML-based configuration for lexa
//!
//! A run is described by a single `lexa.toml`: which Ollama models to use,
//! how documents are chunked and retrieved, who the analysis is for, which
//! documents to load and where results go. The whole file is validated as a
//! unit before any provider is contacted.
//!
//! Environment variables (optionally from `.env`) override the provider
//! settings:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `LEXA_OLLAMA_URL` | `ollama.base_url` |
//! | `LEXA_EMBEDDING_MODEL` | `ollama.embedding_model` |
//! | `LEXA_CHAT_MODEL` | `ollama.chat_model` |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::ollama::{DEFAULT_CHAT_MODEL, DEFAULT_OLLAMA_URL};
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::DEFAULT_EMBEDDING_MODEL;
use crate::types::{AppError, DocumentSpec};

/// Queries run at the start of every session unless disabled
pub const DEFAULT_QUERIES: [&str; 4] = [
    "Analyze the key differences between our requirements and the counterparty's proposed terms across the documents",
    "How should the payment terms be structured to satisfy downstream payment obligations and maintain healthy cash flow?",
    "What specific changes are needed in the intellectual property provisions to protect our obligations to downstream clients?",
    "Draft a concise response to the counterparty that addresses their proposed terms while protecting our interests",
];

/// Root configuration structure loaded from lexa.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexaConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Documents to load, in retrieval tie-break order
    #[serde(default)]
    pub documents: Vec<DocumentSpec>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Upper bound on each embedding call and on the wait for each streamed fragment
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_chunk_size() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    3
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

// ============= Analysis Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Parties involved; the first one is the client
    #[serde(default)]
    pub entities: Vec<String>,

    #[serde(default)]
    pub objective: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_true")]
    pub include_default_queries: bool,

    /// Additional queries, run after the defaults
    #[serde(default)]
    pub queries: Vec<String>,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            objective: String::new(),
            language: default_language(),
            include_default_queries: default_true(),
            queries: Vec::new(),
        }
    }
}

// ============= Output & Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

fn default_output_directory() -> String {
    "output".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent a run but likely degrade it
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    EmptyEntities,
    EmptyObjective,
    NoDocuments,
    NoQueries,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Always wraps [`AppError::InvalidChunkingParameters`], the same error the
    /// chunker raises at run time
    #[error("Invalid rag.chunk_size/rag.chunk_overlap: {0}")]
    InvalidChunking(Box<AppError>),
}

impl LexaConfig {
    /// Load configuration from a TOML file, apply environment overrides and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        let mut config: LexaConfig = toml::from_str(&content)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());

        config.validate()?;

        Ok(config)
    }

    /// Override provider settings from the environment.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LEXA_OLLAMA_URL") {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("LEXA_EMBEDDING_MODEL") {
            self.ollama.embedding_model = model;
        }
        if let Some(model) = lookup("LEXA_CHAT_MODEL") {
            self.ollama.chat_model = model;
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        TextChunker::new(self.rag.chunk_size, self.rag.chunk_overlap)
            .map_err(|e| ConfigError::InvalidChunking(Box::new(e)))?;

        if self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "rag.top_k must be at least 1".to_string(),
            ));
        }

        if self.ollama.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.request_timeout_secs must be at least 1".to_string(),
            ));
        }

        for (field, value) in [
            ("ollama.base_url", &self.ollama.base_url),
            ("ollama.embedding_model", &self.ollama.embedding_model),
            ("ollama.chat_model", &self.ollama.chat_model),
            ("output.directory", &self.output.directory),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} must not be empty", field)));
            }
        }

        let mut seen = HashSet::new();
        for doc in &self.documents {
            if doc.name.trim().is_empty() || doc.path.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "every document needs a non-empty name and path".to_string(),
                ));
            }
            if !seen.insert(doc.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "document name '{}' is used more than once",
                    doc.name
                )));
            }
        }

        Ok(())
    }

    /// Validate configuration and report likely mistakes as warnings
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();

        if self.analysis.entities.iter().all(|e| e.trim().is_empty()) {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::EmptyEntities,
                message: "analysis.entities is empty; prompts will refer to 'the client'"
                    .to_string(),
            });
        }

        if self.analysis.objective.trim().is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::EmptyObjective,
                message: "analysis.objective is empty".to_string(),
            });
        }

        if self.documents.is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoDocuments,
                message: "no [[documents]] configured".to_string(),
            });
        }

        if self.query_plan(&[]).is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoQueries,
                message: "no queries configured and default queries are disabled".to_string(),
            });
        }

        Ok(warnings)
    }

    /// Queries for a session: defaults, then configured, then `extra`.
    /// Blank queries are dropped.
    pub fn query_plan(&self, extra: &[String]) -> Vec<String> {
        let defaults = self
            .analysis
            .include_default_queries
            .then_some(DEFAULT_QUERIES.iter().map(|q| q.to_string()))
            .into_iter()
            .flatten();

        defaults
            .chain(self.analysis.queries.iter().cloned())
            .chain(extra.iter().cloned())
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.request_timeout_secs)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
