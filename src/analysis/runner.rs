//! Drives a single query from retrieval to a fully generated response.
//!
//! ```text
//! Pending -> Retrieving -> Prompting -> Generating -> Complete
//!     \___________\____________\_____________\______-> Failed
//! ```
//!
//! Fragments are handed to the observer as they arrive and folded into an
//! accumulator. Only a stream that reaches its end produces an
//! [`AnalysisResult`]; on failure the partial text is dropped.

use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisObserver;
use crate::analysis::prompt::PromptBuilder;
use crate::llm::LLMClient;
use crate::rag::cache::SessionEmbeddingCache;
use crate::rag::context::assemble;
use crate::rag::search::SemanticRetriever;
use crate::types::{AnalysisResult, AppError, Chunk, QueryState, Result};

/// Tracks and validates the state of one query
struct QueryTracker<'q> {
    query: &'q str,
    state: QueryState,
}

impl<'q> QueryTracker<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            state: QueryState::Pending,
        }
    }

    fn advance(&mut self, next: QueryState, observer: &mut dyn AnalysisObserver) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AppError::Internal(format!(
                "invalid query state transition {} -> {}",
                self.state, next
            )));
        }
        debug!(query = self.query, from = %self.state, to = %next, "query state");
        self.state = next;
        observer.on_state(self.query, next);
        Ok(())
    }

    /// Move to `Failed` unless the query already reached a terminal state
    fn fail(&mut self, observer: &mut dyn AnalysisObserver) {
        if self.state.is_terminal() {
            return;
        }
        debug!(query = self.query, from = %self.state, "query failed");
        self.state = QueryState::Failed;
        observer.on_state(self.query, QueryState::Failed);
    }
}

pub struct AnalysisRunner<'a> {
    retriever: SemanticRetriever<'a>,
    llm: &'a dyn LLMClient,
    prompt: &'a PromptBuilder,
    request_timeout: Duration,
}

impl<'a> AnalysisRunner<'a> {
    pub fn new(
        retriever: SemanticRetriever<'a>,
        llm: &'a dyn LLMClient,
        prompt: &'a PromptBuilder,
        request_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompt,
            request_timeout,
        }
    }

    /// Run `query` against `chunks`, reusing and extending `cache`.
    pub async fn run(
        &self,
        query: &str,
        chunks: &[Chunk],
        cache: &mut SessionEmbeddingCache,
        observer: &mut dyn AnalysisObserver,
    ) -> Result<AnalysisResult> {
        let mut tracker = QueryTracker::new(query);

        match self.execute(&mut tracker, chunks, cache, observer).await {
            Ok(response) => {
                tracker.advance(QueryState::Complete, observer)?;
                info!(query, chars = response.len(), "analysis complete");
                Ok(AnalysisResult {
                    query: query.to_string(),
                    response,
                })
            }
            Err(e) => {
                warn!(query, state = %tracker.state, error = %e, "analysis failed");
                tracker.fail(observer);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        tracker: &mut QueryTracker<'_>,
        chunks: &[Chunk],
        cache: &mut SessionEmbeddingCache,
        observer: &mut dyn AnalysisObserver,
    ) -> Result<String> {
        let query = tracker.query;

        tracker.advance(QueryState::Retrieving, observer)?;
        let top = self.retriever.retrieve(query, chunks, cache).await?;
        if top.is_empty() {
            warn!(query, "no chunks could be ranked, prompting without context");
        }
        let context = assemble(&top);

        tracker.advance(QueryState::Prompting, observer)?;
        let prompt = self.prompt.build(query, &context);

        tracker.advance(QueryState::Generating, observer)?;
        self.generate(&prompt, observer).await
    }

    async fn generate(&self, prompt: &str, observer: &mut dyn AnalysisObserver) -> Result<String> {
        let mut stream = tokio::time::timeout(self.request_timeout, self.llm.stream(prompt))
            .await
            .map_err(|_| self.timed_out("did not start streaming"))??;

        let mut response = String::new();
        loop {
            let next = tokio::time::timeout(self.request_timeout, stream.next())
                .await
                .map_err(|_| self.timed_out("stopped streaming"))?;

            match next {
                Some(Ok(fragment)) => {
                    observer.on_fragment(&fragment);
                    response.push_str(&fragment);
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        Ok(response)
    }

    fn timed_out(&self, what: &str) -> AppError {
        AppError::GenerationProvider(format!(
            "'{}' {} within {}s",
            self.llm.model_name(),
            what,
            self.request_timeout.as_secs_f32()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FragmentStream;
    use crate::rag::cache::EmbeddingCache;
    use crate::rag::embeddings::EmbeddingProvider;
    use async_trait::async_trait;
    use futures::stream;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.is_empty() {
                return Err(AppError::EmbeddingProvider("empty input".to_string()));
            }
            Ok(vec![1.0, text.len() as f32])
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Streams scripted fragments, optionally failing after them
    struct ScriptedLLM {
        fragments: Vec<&'static str>,
        fail_after: bool,
    }

    #[async_trait]
    impl LLMClient for ScriptedLLM {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.fragments.concat())
        }

        async fn stream(&self, _prompt: &str) -> Result<FragmentStream> {
            let mut items: Vec<Result<String>> =
                self.fragments.iter().map(|f| Ok(f.to_string())).collect();
            if self.fail_after {
                items.push(Err(AppError::GenerationProvider("connection reset".to_string())));
            }
            Ok(Box::new(stream::iter(items)))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct Recorder {
        fragments: Vec<String>,
        states: Vec<QueryState>,
    }

    impl AnalysisObserver for Recorder {
        fn on_state(&mut self, _query: &str, state: QueryState) {
            self.states.push(state);
        }

        fn on_fragment(&mut self, fragment: &str) {
            self.fragments.push(fragment.to_string());
        }
    }

    #[test]
    fn test_tracker_fails_once() {
        let mut recorder = Recorder::default();
        let mut tracker = QueryTracker::new("q");

        tracker.advance(QueryState::Retrieving, &mut recorder).unwrap();
        tracker.fail(&mut recorder);
        tracker.fail(&mut recorder);

        assert_eq!(tracker.state, QueryState::Failed);
        assert_eq!(recorder.states, vec![QueryState::Retrieving, QueryState::Failed]);
        assert!(tracker.advance(QueryState::Prompting, &mut recorder).is_err());
    }

    #[test]
    fn test_tracker_does_not_fail_a_completed_query() {
        let mut recorder = Recorder::default();
        let mut tracker = QueryTracker::new("q");
        for state in [
            QueryState::Retrieving,
            QueryState::Prompting,
            QueryState::Generating,
            QueryState::Complete,
        ] {
            tracker.advance(state, &mut recorder).unwrap();
        }

        tracker.fail(&mut recorder);

        assert_eq!(tracker.state, QueryState::Complete);
        assert_eq!(recorder.states.last(), Some(&QueryState::Complete));
    }

    fn chunks() -> Vec<Chunk> {
        vec![Chunk {
            document: "MSA".to_string(),
            index: 0,
            text: "Payment terms are Net 30.".to_string(),
        }]
    }

    fn prompt() -> PromptBuilder {
        PromptBuilder::new(vec!["SCTY".to_string()], "Review terms", "English")
    }

    #[tokio::test]
    async fn test_run_accumulates_stream() {
        let embedder = FixedEmbedder;
        let llm = ScriptedLLM {
            fragments: vec!["Key ", "Issues", ": none"],
            fail_after: false,
        };
        let prompt = prompt();
        let runner = AnalysisRunner::new(
            SemanticRetriever::new(&embedder, 3, Duration::from_secs(5)),
            &llm,
            &prompt,
            Duration::from_secs(5),
        );
        let mut cache = SessionEmbeddingCache::new();
        let mut recorder = Recorder::default();

        let result = runner
            .run("What are the payment terms?", &chunks(), &mut cache, &mut recorder)
            .await
            .unwrap();

        assert_eq!(result.query, "What are the payment terms?");
        assert_eq!(result.response, "Key Issues: none");
        assert_eq!(recorder.fragments, vec!["Key ", "Issues", ": none"]);
        assert_eq!(
            recorder.states,
            vec![
                QueryState::Retrieving,
                QueryState::Prompting,
                QueryState::Generating,
                QueryState::Complete,
            ]
        );
        assert!(cache.contains("MSA_0"));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_partial_response() {
        let embedder = FixedEmbedder;
        let llm = ScriptedLLM {
            fragments: vec!["Partial ", "answer"],
            fail_after: true,
        };
        let prompt = prompt();
        let runner = AnalysisRunner::new(
            SemanticRetriever::new(&embedder, 3, Duration::from_secs(5)),
            &llm,
            &prompt,
            Duration::from_secs(5),
        );
        let mut cache = SessionEmbeddingCache::new();
        let mut recorder = Recorder::default();

        let err = runner
            .run("q", &chunks(), &mut cache, &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerationProvider(_)));
        // Fragments were displayed live, but the run failed
        assert_eq!(recorder.fragments.len(), 2);
        assert_eq!(recorder.states.last(), Some(&QueryState::Failed));
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_during_retrieval() {
        let embedder = FixedEmbedder;
        let llm = ScriptedLLM {
            fragments: vec!["unused"],
            fail_after: false,
        };
        let prompt = prompt();
        let runner = AnalysisRunner::new(
            SemanticRetriever::new(&embedder, 3, Duration::from_secs(5)),
            &llm,
            &prompt,
            Duration::from_secs(5),
        );
        let mut cache = SessionEmbeddingCache::new();
        let mut recorder = Recorder::default();

        // FixedEmbedder rejects the empty query
        let err = runner
            .run("", &chunks(), &mut cache, &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmbeddingProvider(_)));
        assert_eq!(recorder.states, vec![QueryState::Retrieving, QueryState::Failed]);
        assert!(recorder.fragments.is_empty());
    }

    struct SilentLLM;

    #[async_trait]
    impl LLMClient for SilentLLM {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn stream(&self, _prompt: &str) -> Result<FragmentStream> {
            let first = stream::iter(vec![Ok("Thinking".to_string())]);
            Ok(Box::new(first.chain(stream::pending())))
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_stream_times_out() {
        let embedder = FixedEmbedder;
        let llm = SilentLLM;
        let prompt = prompt();
        let runner = AnalysisRunner::new(
            SemanticRetriever::new(&embedder, 3, Duration::from_secs(5)),
            &llm,
            &prompt,
            Duration::from_secs(60),
        );
        let mut cache = SessionEmbeddingCache::new();
        let mut recorder = Recorder::default();

        let err = runner
            .run("q", &chunks(), &mut cache, &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerationProvider(ref m) if m.contains("stopped streaming")));
        assert_eq!(recorder.fragments, vec!["Thinking"]);
    }
}
