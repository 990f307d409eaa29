//! Terminal rendering for lexa
//!
//! Everything the binary prints goes through [`Output`] so that `--no-color`
//! is honored everywhere: the session's progress, the streamed answers, the
//! final summary and the `init`/`config` reports. Plain mode swaps each
//! glyph for a bracketed tag, which keeps the output greppable in CI logs.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::session::SessionReport;

const RULE_WIDTH: usize = 80;

/// Marker printed in front of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Ok,
    Info,
    Warn,
    Fail,
    Kept,
}

impl Mark {
    fn tag(self) -> &'static str {
        match self {
            Mark::Ok => "[OK]",
            Mark::Info => "[INFO]",
            Mark::Warn => "[WARN]",
            Mark::Fail => "[ERROR]",
            Mark::Kept => "[KEPT]",
        }
    }

    fn glyph(self) -> String {
        match self {
            Mark::Ok => "✓".green().bold().to_string(),
            Mark::Info => "•".blue().to_string(),
            Mark::Warn => "⚠".yellow().bold().to_string(),
            Mark::Fail => "✗".red().bold().to_string(),
            Mark::Kept => "○".yellow().to_string(),
        }
    }
}

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn marker(&self, mark: Mark) -> String {
        if self.colored {
            mark.glyph()
        } else {
            mark.tag().to_string()
        }
    }

    fn status(&self, mark: Mark, message: &str) {
        let text = match (self.colored, mark) {
            (true, Mark::Ok) => message.green().to_string(),
            (true, Mark::Warn) => message.yellow().to_string(),
            (true, Mark::Fail) => message.red().to_string(),
            _ => message.to_string(),
        };
        let line = format!("  {} {}", self.marker(mark), text);
        // Failures go to stderr with the rest of the diagnostics
        if mark == Mark::Fail {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Print the lexa banner
    pub fn banner(&self) {
        const ART: [&str; 5] = [
            " _     _______  __    _    ",
            "| |   | ____\\ \\/ /   / \\   ",
            "| |   |  _|  \\  /   / _ \\  ",
            "| |___| |___ /  \\  / ___ \\ ",
            "|_____|_____/_/\\_\\/_/   \\_\\",
        ];
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));

        println!();
        if self.colored {
            for (i, row) in ART.iter().enumerate() {
                if i < 3 {
                    println!("   {}", row.bright_cyan().bold());
                } else {
                    println!("   {}", row.blue().bold());
                }
            }
            println!(
                "\n   {} {}\n",
                "Legal Document Analysis".bright_white().bold(),
                version.dimmed()
            );
        } else {
            for row in ART {
                println!("   {}", row.trim_end());
            }
            println!("\n   Legal Document Analysis {}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        self.status(Mark::Ok, message);
    }

    pub fn info(&self, message: &str) {
        self.status(Mark::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Mark::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Mark::Fail, message);
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// A shell command the user is expected to run
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    pub fn newline(&self) {
        println!();
    }

    // ------------------------------------------------------------------
    // Project scaffolding
    // ------------------------------------------------------------------

    /// A file or directory written by `lexa init`
    pub fn created(&self, kind: &str, path: &str) {
        if self.colored {
            println!("  {} {} {}", self.marker(Mark::Ok), kind.dimmed(), path.bright_white());
        } else {
            println!("  [CREATED] {} {}", kind, path);
        }
    }

    /// An existing path `lexa init` left untouched
    pub fn kept(&self, path: &str) {
        let note = "(already exists)";
        if self.colored {
            println!("  {} {} {}", self.marker(Mark::Kept), path.dimmed(), note.yellow());
        } else {
            println!("  {} {} {}", Mark::Kept.tag(), path, note);
        }
    }

    // ------------------------------------------------------------------
    // Analysis session
    // ------------------------------------------------------------------

    pub fn document_loaded(&self, name: &str, chunks: usize) {
        self.success(&format!("{} ({} chunks)", name, chunks));
    }

    pub fn document_skipped(&self, name: &str, reason: &str) {
        self.warning(&format!("Skipping {}: {}", name, reason));
    }

    fn rule(&self) {
        if self.colored {
            println!("{}", "─".repeat(RULE_WIDTH).dimmed());
        } else {
            println!("{}", "=".repeat(RULE_WIDTH));
        }
    }

    /// Opens query `index` of `total` (1-based) between two rules
    pub fn query_heading(&self, index: usize, total: usize, query: &str) {
        let progress = format!("[{}/{}]", index, total);
        println!();
        self.rule();
        if self.colored {
            println!("  {} {}", progress.dimmed(), query.bright_white().bold());
        } else {
            println!("  {} {}", progress, query);
        }
        self.rule();
    }

    pub fn answer_start(&self) {
        self.subheader("Analysis & Response");
        self.newline();
    }

    /// A streamed fragment, printed as-is and flushed immediately
    pub fn answer_fragment(&self, text: &str) {
        print!("{}", text);
        io::stdout().flush().ok();
    }

    /// Terminates the streamed answer with a newline
    pub fn answer_end(&self) {
        self.newline();
    }

    pub fn query_failed(&self, error: &str) {
        self.error(&format!("Query failed: {}", error));
    }

    /// Totals printed after the last query
    pub fn summary(&self, report: &SessionReport) {
        self.header("Summary");
        self.kv("documents", &report.documents_loaded.join(", "));
        if !report.documents_skipped.is_empty() {
            self.kv("skipped", &report.documents_skipped.join(", "));
        }
        self.kv("chunks", &report.chunk_count.to_string());
        self.kv("completed", &report.completed().to_string());
        self.kv("failed", &report.failed().to_string());
        self.kv("cache hit rate", &format!("{:.1}%", report.cache.hit_rate()));

        match &report.artifact {
            Some(path) => self.complete(&format!("Analysis saved to {}", path)),
            None => self.warning("No query completed; nothing was saved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::cache::CacheStats;
    use crate::session::QueryOutcome;
    use crate::types::QueryState;

    #[test]
    fn test_output_constructors() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_plain_markers_are_tags() {
        let output = Output::no_color();
        assert_eq!(output.marker(Mark::Ok), "[OK]");
        assert_eq!(output.marker(Mark::Warn), "[WARN]");
        assert_eq!(output.marker(Mark::Kept), "[KEPT]");
        assert!(Output::new().marker(Mark::Fail).contains('✗'));
    }

    fn report(artifact: Option<&str>) -> SessionReport {
        SessionReport {
            session_id: "20250101_120000".to_string(),
            artifact: artifact.map(str::to_string),
            documents_loaded: vec!["MSA".to_string()],
            documents_skipped: vec!["SOW".to_string()],
            chunk_count: 4,
            outcomes: vec![QueryOutcome {
                query: "What are the payment terms?".to_string(),
                state: QueryState::Complete,
                error: None,
            }],
            cache: CacheStats::default(),
        }
    }

    #[test]
    fn test_session_rendering_no_panic() {
        for output in [Output::no_color(), Output::new()] {
            output.banner();
            output.document_loaded("MSA", 4);
            output.document_skipped("SOW", "file not found");
            output.query_heading(2, 5, "Who owns the IP?");
            output.answer_start();
            output.answer_fragment("Ключевые ");
            output.answer_fragment("вопросы");
            output.answer_end();
            output.query_failed("timeout");
            output.summary(&report(Some("output/analysis_20250101_120000.md")));
            output.summary(&report(None));
        }
    }

    #[test]
    fn test_project_rendering_no_panic() {
        for output in [Output::no_color(), Output::new()] {
            output.header("Initializing lexa Project");
            output.created("directory", "doc");
            output.kept("output");
            output.info("Run the analysis:");
            output.command("lexa");
            output.hint("Results are written to output/");
            output.kv("Chat model", "qwq");
            output.list_item("MSA (doc/msa.md)");
            output.complete("done");
        }
    }
}
