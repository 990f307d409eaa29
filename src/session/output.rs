//! Session artifacts.
//!
//! Every completed query is appended to a single markdown file per session,
//! `analysis_{session_id}.md`. The directory and the file are created on the
//! first write, so a session in which nothing completes leaves no artifact.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::types::{AnalysisResult, AppError, Result};

/// Receives completed analysis results
pub trait OutputSink: Send {
    /// Append one query/response record to the session's artifact
    fn append(&mut self, session_id: &str, result: &AnalysisResult) -> Result<()>;

    /// Human-readable location of the session's artifact
    fn location(&self, session_id: &str) -> String;
}

/// Writes `analysis_{session_id}.md` into a directory
#[derive(Debug, Clone)]
pub struct MarkdownSink {
    directory: PathBuf,
}

impl MarkdownSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path(&self, session_id: &str) -> PathBuf {
        self.directory.join(format!("analysis_{}.md", session_id))
    }
}

fn header(session_id: &str) -> String {
    format!("# Legal Document Analysis\n\nSession: {}\n\n", session_id)
}

/// Query and response are written verbatim; whitespace can be markdown
fn record(result: &AnalysisResult) -> String {
    format!(
        "## Query\n\n{}\n\n### Response\n\n{}\n\n---\n\n",
        result.query, result.response
    )
}

impl OutputSink for MarkdownSink {
    fn append(&mut self, session_id: &str, result: &AnalysisResult) -> Result<()> {
        let path = self.path(session_id);
        let io_err = |e: std::io::Error| AppError::Output(format!("{}: {}", path.display(), e));

        fs::create_dir_all(&self.directory).map_err(io_err)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        // A fresh file gets the title header first
        let is_new = file.metadata().map_err(io_err)?.len() == 0;
        if is_new {
            file.write_all(header(session_id).as_bytes()).map_err(io_err)?;
        }
        file.write_all(record(result).as_bytes()).map_err(io_err)?;

        debug!(path = %path.display(), new = is_new, "appended analysis record");
        Ok(())
    }

    fn location(&self, session_id: &str) -> String {
        self.path(session_id).display().to_string()
    }
}
