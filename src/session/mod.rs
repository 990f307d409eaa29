//! Session orchestration.
//!
//! A [`Session`] is one run from loaded configuration to persisted results:
//!
//! 1. Load every configured document; missing ones are skipped.
//! 2. Chunk all loaded documents.
//! 3. Run each query in order through the [`AnalysisRunner`], sharing one
//!    embedding cache across the whole session.
//! 4. Append every completed result to the session artifact.
//!
//! A failed query is recorded and the session moves on. Failing to persist a
//! result ends the session, since the artifact can no longer be trusted.

pub mod documents;
pub mod output;

pub use documents::{DocumentSource, FsDocumentSource};
pub use output::{MarkdownSink, OutputSink};

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{AnalysisObserver, AnalysisRunner, PromptBuilder};
use crate::llm::{LLMClient, OllamaClient};
use crate::rag::cache::{CacheStats, EmbeddingCache, SessionEmbeddingCache};
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::{EmbeddingProvider, OllamaEmbedder};
use crate::rag::search::SemanticRetriever;
use crate::types::{AppError, Chunk, QueryState, Result};
use crate::utils::toml_config::LexaConfig;

/// Session identifier: local time as `YYYYMMDD_HHMMSS`
pub fn new_session_id() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// What happened to one query of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub state: QueryState,
    pub error: Option<String>,
}

/// Summary of a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    /// Where results were written; `None` when no query completed
    pub artifact: Option<String>,
    pub documents_loaded: Vec<String>,
    pub documents_skipped: Vec<String>,
    pub chunk_count: usize,
    pub outcomes: Vec<QueryOutcome>,
    pub cache: CacheStats,
}

impl SessionReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == QueryState::Complete)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == QueryState::Failed)
            .count()
    }
}

/// Session-level progress, on top of per-query analysis progress
pub trait SessionObserver: AnalysisObserver {
    fn on_document_loaded(&mut self, _name: &str, _chunks: usize) {}

    fn on_document_skipped(&mut self, _name: &str, _error: &AppError) {}

    /// `index` is 1-based
    fn on_query_start(&mut self, _index: usize, _total: usize, _query: &str) {}

    fn on_query_finished(&mut self, _outcome: &QueryOutcome) {}
}

pub struct Session {
    config: LexaConfig,
    session_id: String,
    documents: Box<dyn DocumentSource>,
    embedder: Box<dyn EmbeddingProvider>,
    llm: Box<dyn LLMClient>,
    sink: Box<dyn OutputSink>,
    cache: SessionEmbeddingCache,
}

impl Session {
    pub fn new(
        config: LexaConfig,
        documents: Box<dyn DocumentSource>,
        embedder: Box<dyn EmbeddingProvider>,
        llm: Box<dyn LLMClient>,
        sink: Box<dyn OutputSink>,
    ) -> Self {
        Self {
            config,
            session_id: new_session_id(),
            documents,
            embedder,
            llm,
            sink,
            cache: SessionEmbeddingCache::new(),
        }
    }

    /// Build a session backed by Ollama, the filesystem and a markdown artifact.
    ///
    /// Document paths resolve against `base_dir` (the config file's directory).
    pub fn from_config(config: LexaConfig, base_dir: &Path) -> Result<Self> {
        config.validate()?;

        let embedder = OllamaEmbedder::new(&config.ollama.base_url, config.ollama.embedding_model.clone())?;
        let llm = OllamaClient::new(&config.ollama.base_url, config.ollama.chat_model.clone())?;
        let sink = MarkdownSink::new(&config.output.directory);

        Ok(Self::new(
            config,
            Box::new(FsDocumentSource::new(base_dir)),
            Box::new(embedder),
            Box::new(llm),
            Box::new(sink),
        ))
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &LexaConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Run `queries` in order over the configured documents
    pub async fn run<O: SessionObserver>(
        &mut self,
        queries: &[String],
        observer: &mut O,
    ) -> Result<SessionReport> {
        info!(session = %self.session_id, queries = queries.len(), "starting session");

        let chunker = TextChunker::new(self.config.rag.chunk_size, self.config.rag.chunk_overlap)?;

        let mut loaded = Vec::new();
        let mut skipped = Vec::new();
        let mut chunks: Vec<Chunk> = Vec::new();
        for spec in &self.config.documents {
            match self.documents.load(spec).await {
                Ok(doc) => {
                    let doc_chunks = chunker.chunk_document(&doc);
                    info!(document = %doc.name, chunks = doc_chunks.len(), "document loaded");
                    observer.on_document_loaded(&doc.name, doc_chunks.len());
                    chunks.extend(doc_chunks);
                    loaded.push(doc.name);
                }
                Err(e) => {
                    warn!(document = %spec.name, error = %e, "skipping document");
                    observer.on_document_skipped(&spec.name, &e);
                    skipped.push(spec.name.clone());
                }
            }
        }

        if loaded.is_empty() {
            return Err(AppError::NoDocuments);
        }

        let analysis = &self.config.analysis;
        let prompt = PromptBuilder::new(
            analysis.entities.clone(),
            analysis.objective.clone(),
            analysis.language.clone(),
        );
        let timeout = self.config.request_timeout();
        let runner = AnalysisRunner::new(
            SemanticRetriever::new(self.embedder.as_ref(), self.config.rag.top_k, timeout),
            self.llm.as_ref(),
            &prompt,
            timeout,
        );

        let mut outcomes = Vec::with_capacity(queries.len());
        for (i, query) in queries.iter().enumerate() {
            observer.on_query_start(i + 1, queries.len(), query);

            let outcome = match runner.run(query, &chunks, &mut self.cache, &mut *observer).await {
                Ok(result) => {
                    self.sink.append(&self.session_id, &result)?;
                    QueryOutcome {
                        query: query.clone(),
                        state: QueryState::Complete,
                        error: None,
                    }
                }
                Err(e) => QueryOutcome {
                    query: query.clone(),
                    state: QueryState::Failed,
                    error: Some(e.to_string()),
                },
            };

            observer.on_query_finished(&outcome);
            outcomes.push(outcome);
        }

        let any_completed = outcomes.iter().any(|o| o.state == QueryState::Complete);
        let report = SessionReport {
            session_id: self.session_id.clone(),
            artifact: any_completed.then(|| self.sink.location(&self.session_id)),
            documents_loaded: loaded,
            documents_skipped: skipped,
            chunk_count: chunks.len(),
            outcomes,
            cache: self.cache.stats(),
        };

        info!(
            session = %report.session_id,
            completed = report.completed(),
            failed = report.failed(),
            cache_hit_rate = report.cache.hit_rate(),
            "session finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = new_session_id();
        assert_eq!(id.len(), 15);
        assert_eq!(id.as_bytes()[8], b'_');
        assert!(id.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_report_counts() {
        let outcome = |state| QueryOutcome {
            query: "q".to_string(),
            state,
            error: None,
        };
        let report = SessionReport {
            session_id: "s".to_string(),
            artifact: None,
            documents_loaded: vec!["MSA".to_string()],
            documents_skipped: vec![],
            chunk_count: 1,
            outcomes: vec![
                outcome(QueryState::Complete),
                outcome(QueryState::Failed),
                outcome(QueryState::Complete),
            ],
            cache: CacheStats::default(),
        };
        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 1);
    }
}
