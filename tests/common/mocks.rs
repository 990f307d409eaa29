//! Mock implementations for testing.
//!
//! In-memory stand-ins for the session's collaborators: an embedder that maps
//! keywords to vector dimensions, a chat model that streams scripted
//! fragments, a document source backed by a map and a sink that records what
//! it is given. Each mock exposes shared handles so a test can inspect it after
//! the session has taken ownership.

use async_trait::async_trait;
use futures::stream;
use lexa::analysis::AnalysisObserver;
use lexa::llm::{FragmentStream, LLMClient};
use lexa::rag::embeddings::EmbeddingProvider;
use lexa::session::{DocumentSource, OutputSink, QueryOutcome, SessionObserver};
use lexa::types::{AnalysisResult, AppError, Document, DocumentSpec, QueryState, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Embeds text as keyword counts, one dimension per keyword.
///
/// With keywords `["payment", "delivery"]`, "payment terms" embeds to
/// `[1.0, 0.0]` and a text mentioning neither keyword to the zero vector.
#[derive(Clone)]
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    calls: Arc<AtomicUsize>,
    fail_on: Option<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_on: None,
        }
    }

    /// Fail any embedding request whose text contains `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                return Err(AppError::EmbeddingProvider("model not loaded".to_string()));
            }
        }
        let lower = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| lower.matches(k.as_str()).count() as f32)
            .collect())
    }

    fn model_name(&self) -> &str {
        "keyword-embedder"
    }
}

/// Streams a fixed set of fragments for every prompt and records the prompts.
#[derive(Clone)]
pub struct ScriptedLLM {
    fragments: Vec<String>,
    prompts: Arc<Mutex<Vec<String>>>,
    fail_when_prompt_contains: Option<String>,
}

impl ScriptedLLM {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fail_when_prompt_contains: None,
        }
    }

    /// Break the stream midway when the prompt contains `marker`
    pub fn failing_when(mut self, marker: &str) -> Self {
        self.fail_when_prompt_contains = Some(marker.to_string());
        self
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.fragments.concat())
    }

    async fn stream(&self, prompt: &str) -> Result<FragmentStream> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let fails = self
            .fail_when_prompt_contains
            .as_ref()
            .is_some_and(|m| prompt.contains(m.as_str()));

        let mut items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        if fails {
            items.truncate(1);
            items.push(Err(AppError::GenerationProvider("connection reset".to_string())));
        }
        Ok(Box::new(stream::iter(items)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Documents held in memory, keyed by configured path
#[derive(Default)]
pub struct MemoryDocuments {
    files: HashMap<String, String>,
}

impl MemoryDocuments {
    pub fn with(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl DocumentSource for MemoryDocuments {
    async fn load(&self, spec: &DocumentSpec) -> Result<Document> {
        self.files
            .get(&spec.path)
            .map(|content| Document::new(spec.name.clone(), content.clone()))
            .ok_or_else(|| AppError::DocumentNotFound {
                name: spec.name.clone(),
                path: spec.path.clone(),
            })
    }
}

/// Records every appended result
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(String, AnalysisResult)>>>,
    broken: bool,
}

impl MemorySink {
    /// A sink whose every write fails
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Arc<Mutex<Vec<(String, AnalysisResult)>>> {
        Arc::clone(&self.records)
    }
}

impl OutputSink for MemorySink {
    fn append(&mut self, session_id: &str, result: &AnalysisResult) -> Result<()> {
        if self.broken {
            return Err(AppError::Output("disk full".to_string()));
        }
        self.records
            .lock()
            .unwrap()
            .push((session_id.to_string(), result.clone()));
        Ok(())
    }

    fn location(&self, session_id: &str) -> String {
        format!("memory://{}", session_id)
    }
}

/// Observer that remembers everything it is told
#[derive(Default)]
pub struct RecordingObserver {
    pub fragments: Vec<String>,
    pub states: Vec<(String, QueryState)>,
    pub loaded: Vec<(String, usize)>,
    pub skipped: Vec<String>,
    pub started: Vec<(usize, usize, String)>,
    pub finished: Vec<QueryOutcome>,
}

impl AnalysisObserver for RecordingObserver {
    fn on_state(&mut self, query: &str, state: QueryState) {
        self.states.push((query.to_string(), state));
    }

    fn on_fragment(&mut self, fragment: &str) {
        self.fragments.push(fragment.to_string());
    }
}

impl SessionObserver for RecordingObserver {
    fn on_document_loaded(&mut self, name: &str, chunks: usize) {
        self.loaded.push((name.to_string(), chunks));
    }

    fn on_document_skipped(&mut self, name: &str, _error: &AppError) {
        self.skipped.push(name.to_string());
    }

    fn on_query_start(&mut self, index: usize, total: usize, query: &str) {
        self.started.push((index, total, query.to_string()));
    }

    fn on_query_finished(&mut self, outcome: &QueryOutcome) {
        self.finished.push(outcome.clone());
    }
}
