//! Terminal rendering of a running session.

use crate::analysis::AnalysisObserver;
use crate::cli::output::Output;
use crate::session::{QueryOutcome, SessionObserver};
use crate::types::{AppError, QueryState};

/// Streams each answer to stdout as it is generated
pub struct ConsoleObserver<'a> {
    output: &'a Output,
    verbose: bool,
    streaming: bool,
}

impl<'a> ConsoleObserver<'a> {
    pub fn new(output: &'a Output, verbose: bool) -> Self {
        Self {
            output,
            verbose,
            streaming: false,
        }
    }
}

impl AnalysisObserver for ConsoleObserver<'_> {
    fn on_state(&mut self, _query: &str, state: QueryState) {
        if self.verbose && !matches!(state, QueryState::Generating | QueryState::Complete) {
            self.output.kv("state", &state.to_string());
        }
        if state == QueryState::Generating {
            self.output.answer_start();
            self.streaming = true;
        }
    }

    fn on_fragment(&mut self, fragment: &str) {
        self.output.answer_fragment(fragment);
    }
}

impl SessionObserver for ConsoleObserver<'_> {
    fn on_document_loaded(&mut self, name: &str, chunks: usize) {
        self.output.document_loaded(name, chunks);
    }

    fn on_document_skipped(&mut self, name: &str, error: &AppError) {
        self.output.document_skipped(name, &error.to_string());
    }

    fn on_query_start(&mut self, index: usize, total: usize, query: &str) {
        self.output.query_heading(index, total, query);
    }

    fn on_query_finished(&mut self, outcome: &QueryOutcome) {
        if self.streaming {
            self.output.answer_end();
            self.streaming = false;
        }
        if let Some(error) = &outcome.error {
            self.output.query_failed(error);
        }
    }
}
