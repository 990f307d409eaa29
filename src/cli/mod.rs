//! CLI module for lexa
//!
//! Provides command-line interface parsing for the `lexa` binary.
//! Uses clap for argument parsing, owo-colors for colored terminal output and
//! dialoguer for interactive run configuration.

pub mod console;
pub mod init;
pub mod interactive;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::types::DocumentSpec;

/// lexa - retrieval-augmented analysis of legal documents
#[derive(Parser, Debug)]
#[command(
    name = "lexa",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "lexa - retrieval-augmented analysis of legal documents",
    long_about = "Splits contracts and correspondence into overlapping chunks, retrieves the\n\
                  passages most relevant to each question by semantic similarity, and streams\n\
                  an analysis from a local Ollama model.\n\n\
                  Run without a subcommand to analyze, or use 'init' to scaffold a new project.",
    after_help = "EXAMPLES:\n    \
                  lexa init                                  # Scaffold lexa.toml, doc/ and output/\n    \
                  lexa                                       # Run the configured queries\n    \
                  lexa analyze -q \"Who owns the IP?\"         # Add a query to the plan\n    \
                  lexa analyze --document MSA=doc/msa.md     # Add a document\n    \
                  lexa analyze --interactive                 # Collect entities and queries interactively\n    \
                  lexa config --validate                     # Check lexa.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "lexa.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze the configured documents (default)
    Analyze(AnalyzeArgs),

    /// Initialize a new lexa project
    ///
    /// Creates lexa.toml plus the doc/ and output/ directories.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration information
    Config {
        /// Print the effective configuration as TOML
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// Options for an analysis run
#[derive(Args, Debug, Default, Clone)]
pub struct AnalyzeArgs {
    /// Additional query, run after the configured ones (repeatable)
    #[arg(short, long = "query", value_name = "QUERY")]
    pub queries: Vec<String>,

    /// Additional document as NAME=PATH (repeatable)
    #[arg(short, long = "document", value_name = "NAME=PATH", value_parser = parse_document_arg)]
    pub documents: Vec<DocumentSpec>,

    /// Number of chunks retrieved per query
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Directory for the session's analysis file
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Collect entities, objective and queries interactively
    #[arg(short, long)]
    pub interactive: bool,

    /// Skip the built-in default queries
    #[arg(long)]
    pub no_default_queries: bool,
}

/// Parse a `NAME=PATH` document argument
pub fn parse_document_arg(value: &str) -> Result<DocumentSpec, String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", value))?;
    let (name, path) = (name.trim(), path.trim());
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{}'", value));
    }
    Ok(DocumentSpec {
        name: name.to_string(),
        path: path.to_string(),
    })
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, `analyze` when none was given
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Analyze(AnalyzeArgs::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_analyze() {
        let cli = Cli::try_parse_from(["lexa"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("lexa.toml"));
        assert!(matches!(cli.command_or_default(), Commands::Analyze(ref a) if a.queries.is_empty()));
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from([
            "lexa",
            "--config",
            "contracts/lexa.toml",
            "analyze",
            "-q",
            "Who owns the IP?",
            "--query",
            "What are the payment terms?",
            "--document",
            "MSA=doc/msa.md",
            "-k",
            "5",
            "--no-default-queries",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("contracts/lexa.toml"));
        let Commands::Analyze(args) = cli.command_or_default() else {
            panic!("expected analyze");
        };
        assert_eq!(args.queries.len(), 2);
        assert_eq!(args.documents[0].name, "MSA");
        assert_eq!(args.documents[0].path, "doc/msa.md");
        assert_eq!(args.top_k, Some(5));
        assert!(args.no_default_queries);
        assert!(!args.interactive);
    }

    #[test]
    fn test_init_and_config_args() {
        let cli = Cli::try_parse_from(["lexa", "init", "case", "--force"]).unwrap();
        assert!(matches!(
            cli.command_or_default(),
            Commands::Init { ref path, force: true } if path == &PathBuf::from("case")
        ));

        let cli = Cli::try_parse_from(["lexa", "--no-color", "config", "--validate"]).unwrap();
        assert!(cli.no_color);
        assert!(matches!(
            cli.command_or_default(),
            Commands::Config {
                full: false,
                validate: true
            }
        ));
    }

    #[test]
    fn test_parse_document_arg() {
        let spec = parse_document_arg(" SOW = doc/sow v2.md ").unwrap();
        assert_eq!(spec.name, "SOW");
        assert_eq!(spec.path, "doc/sow v2.md");

        assert!(parse_document_arg("doc/sow.md").is_err());
        assert!(parse_document_arg("=doc/sow.md").is_err());
        assert!(parse_document_arg("SOW=").is_err());
    }

    #[test]
    fn test_rejects_malformed_document_flag() {
        assert!(Cli::try_parse_from(["lexa", "analyze", "--document", "msa.md"]).is_err());
    }
}
