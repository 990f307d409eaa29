//! lexa CLI Entry Point
//!
//! - `lexa` / `lexa analyze` - Run the query plan over the configured documents
//! - `lexa init [PATH]` - Scaffold a new project
//! - `lexa config` - Show or validate the configuration

use std::path::Path;

use anyhow::{Context, bail};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lexa::cli::console::ConsoleObserver;
use lexa::cli::init::{self, InitConfig, InitResult};
use lexa::cli::interactive;
use lexa::cli::output::Output;
use lexa::cli::{AnalyzeArgs, Cli, Commands};
use lexa::session::Session;
use lexa::utils::toml_config::{ConfigError, LexaConfig, LogFormat, LoggingConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command_or_default() {
        Commands::Init { path, force } => {
            init_logging(&LoggingConfig::default(), cli.verbose);
            match init::run(InitConfig { path, force }, &output) {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => bail!("init failed: {}", e),
            }
        }
        Commands::Config { full, validate } => show_config(&cli, &output, full, validate),
        Commands::Analyze(args) => analyze(&cli, &output, args).await,
    }
}

/// Logs go to stderr so the streamed analysis on stdout stays clean.
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,lexa={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
}

fn load_config(cli: &Cli, output: &Output) -> anyhow::Result<LexaConfig> {
    match LexaConfig::load(&cli.config) {
        Ok(config) => Ok(config),
        Err(e) => {
            if matches!(e, ConfigError::FileNotFound(_)) {
                output.hint("Run 'lexa init' to create a lexa.toml");
            }
            Err::<LexaConfig, _>(e).with_context(|| format!("Failed to load {}", cli.config.display()))
        }
    }
}

fn apply_overrides(config: &mut LexaConfig, args: &AnalyzeArgs) {
    config.documents.extend(args.documents.iter().cloned());
    if let Some(top_k) = args.top_k {
        config.rag.top_k = top_k;
    }
    if let Some(dir) = &args.output_dir {
        config.output.directory = dir.display().to_string();
    }
    if args.no_default_queries {
        config.analysis.include_default_queries = false;
    }
}

async fn analyze(cli: &Cli, output: &Output, args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = load_config(cli, output)?;
    init_logging(&config.logging, cli.verbose);

    apply_overrides(&mut config, &args);

    let mut extra = args.queries.clone();
    if args.interactive {
        let answers = interactive::collect(&config)?;
        extra.extend(answers.apply(&mut config));
    }

    for warning in config.validate_with_warnings()? {
        output.warning(&warning.to_string());
    }

    let queries = config.query_plan(&extra);
    if queries.is_empty() {
        bail!("No queries to run: add [analysis] queries, pass --query, or enable the default queries");
    }

    let base_dir = cli
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    output.banner();
    output.header("Session");
    output.kv("embedding model", &config.ollama.embedding_model);
    output.kv("chat model", &config.ollama.chat_model);
    output.kv("queries", &queries.len().to_string());

    let mut session = Session::from_config(config, base_dir)?;
    output.kv("session", session.session_id());

    output.subheader("Loading documents");
    let mut observer = ConsoleObserver::new(output, cli.verbose);
    let report = session.run(&queries, &mut observer).await?;

    output.summary(&report);

    if report.completed() == 0 && report.failed() > 0 {
        bail!("all {} queries failed", report.failed());
    }

    Ok(())
}

fn show_config(cli: &Cli, output: &Output, full: bool, validate: bool) -> anyhow::Result<()> {
    let config = load_config(cli, output)?;
    init_logging(&config.logging, cli.verbose);

    output.header("lexa Configuration");
    output.newline();
    output.kv("Config file", &cli.config.display().to_string());
    output.kv("Ollama", &config.ollama.base_url);
    output.kv("Embedding model", &config.ollama.embedding_model);
    output.kv("Chat model", &config.ollama.chat_model);
    output.kv(
        "Chunking",
        &format!(
            "{} chars, {} overlap, top {}",
            config.rag.chunk_size, config.rag.chunk_overlap, config.rag.top_k
        ),
    );
    output.kv("Output", &config.output.directory);

    output.subheader("Documents");
    for doc in &config.documents {
        output.list_item(&format!("{} ({})", doc.name, doc.path));
    }

    output.subheader("Queries");
    for query in config.query_plan(&[]) {
        output.list_item(&query);
    }

    if validate {
        output.subheader("Validation");
        let warnings = config.validate_with_warnings()?;
        for warning in &warnings {
            output.warning(&warning.to_string());
        }
        output.success("Configuration is valid");
    }

    if full {
        output.subheader("Effective configuration");
        println!("{}", config.to_toml()?);
    }

    Ok(())
}
