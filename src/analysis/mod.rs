//! Query analysis: prompt construction and the per-query runner.

pub mod prompt;
pub mod runner;

pub use prompt::PromptBuilder;
pub use runner::AnalysisRunner;

use crate::types::QueryState;

/// Receives progress from an analysis run.
///
/// Display is a consumer of the generation stream in its own right: the
/// runner hands every fragment to the observer before folding it into the
/// response, and the observer never sees the accumulated text.
pub trait AnalysisObserver {
    /// A query moved to `state`
    fn on_state(&mut self, _query: &str, _state: QueryState) {}

    /// A fragment of the response arrived
    fn on_fragment(&mut self, fragment: &str);
}
