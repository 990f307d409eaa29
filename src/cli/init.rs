//! Init command implementation
//!
//! Scaffolds a new lexa project: `lexa.toml`, a `doc/` directory for the
//! documents under review, an `output/` directory for session artifacts and
//! a `.env.example` listing the provider overrides.

use super::output::Output;
use crate::utils::toml_config::DEFAULT_QUERIES;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (lexa.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing lexa Project");

    let base_path = &config.path;

    let config_path = base_path.join("lexa.toml");
    if config_path.exists() && !config.force {
        output.warning("lexa.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating directories");

    for dir in ["doc", "output"] {
        let dir_path = base_path.join(dir);
        if !dir_path.exists() {
            if let Err(e) = fs::create_dir_all(&dir_path) {
                output.error(&format!("Failed to create {}: {}", dir, e));
                return InitResult::Error(e.to_string());
            }
            output.created("directory", dir);
        } else {
            output.kept(dir);
        }
    }

    output.subheader("Creating configuration files");

    if let Err(e) = write_file(&config_path, &generate_lexa_toml(), config.force) {
        output.error(&format!("Failed to create lexa.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "lexa.toml");

    if let Err(e) = write_file(&base_path.join(".env.example"), &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("lexa project initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Put the documents under review in doc/ and list them in lexa.toml");
    output.newline();
    output.info("2. Start Ollama and pull the models:");
    output.command("ollama serve");
    output.command("ollama pull nomic-embed-text");
    output.command("ollama pull qwq");
    output.newline();
    output.info("3. Run the analysis:");
    output.command("lexa");
    output.newline();

    output.hint("Results are written to output/analysis_<timestamp>.md");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(()); // Skip existing files unless force is true
    }
    fs::write(path, content)
}

fn generate_lexa_toml() -> String {
    let queries = DEFAULT_QUERIES
        .iter()
        .map(|q| format!("#   \"{}\",", q))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"# lexa configuration
# ==================

[ollama]
base_url = "http://localhost:11434"
embedding_model = "nomic-embed-text"
chat_model = "qwq"
# Upper bound on each embedding call and on the wait for each streamed fragment
request_timeout_secs = 300

[rag]
# Window size and overlap, in characters
chunk_size = 2000
chunk_overlap = 200
# Chunks retrieved per query
top_k = 3

[analysis]
# The first entity is the client whose interests the analysis protects
entities = ["Your Company", "Counterparty", "End Client"]
objective = "Negotiate terms that are consistent with our downstream obligations"
language = "English"

# Built-in queries run first:
{queries}
include_default_queries = true

# Additional queries, run after the built-in ones
queries = []

# Documents are retrieved in the order listed here.
# Relative paths resolve against this file's directory.
[[documents]]
name = "MSA"
path = "doc/msa.md"

[[documents]]
name = "SOW"
path = "doc/sow.md"

[output]
directory = "output"

[logging]
# trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "info"
# pretty or json
format = "pretty"
"#
    )
}

fn generate_env_example() -> String {
    r#"# lexa Environment Variables
# ==========================
# Copy this file to .env to override lexa.toml.

# LEXA_OLLAMA_URL=http://localhost:11434
# LEXA_EMBEDDING_MODEL=nomic-embed-text
# LEXA_CHAT_MODEL=qwq

# Logging level (trace, debug, info, warn, error)
RUST_LOG=info,lexa=debug
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# lexa session artifacts
/output/

# Environment
.env
.env.local

# OS
.DS_Store
Thumbs.db
"#
    .to_string()
}
