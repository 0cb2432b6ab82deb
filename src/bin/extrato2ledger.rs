//! CLI binary for extrato2ledger.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, runs a batch, and prints the resulting statements as
//! JSON records.

use anyhow::{Context, Result};
use clap::Parser;
use extrato2ledger::{
    format_batch, LlamaParseClient, LlmClassifier, PipelineConfig, StatementUpload,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Format one statement (JSON records on stdout)
  extrato2ledger extrato_marco.pdf

  # Format a whole batch, in order
  extrato2ledger jan.pdf fev.pdf mar.pdf > ledger.json

  # Use a specific model
  extrato2ledger --model gpt-4o --provider openai extrato.pdf

  # Slow parser? raise the poll ceiling
  extrato2ledger --poll-timeout 1800 extrato_escaneado.pdf

ENVIRONMENT VARIABLES:
  LLAMA_CLOUD_API_KEY     Parsing-service credential (required)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key

SETUP:
  1. export LLAMA_CLOUD_API_KEY=llx-...
  2. export OPENAI_API_KEY=sk-...
  3. extrato2ledger extrato.pdf > ledger.json

The batch is all-or-nothing: if any file fails, no statements are printed."#;

/// Turn bank-statement PDFs into typed transaction ledgers.
#[derive(Parser, Debug)]
#[command(
    name = "extrato2ledger",
    version,
    about = "Turn bank-statement PDFs into typed transaction ledgers",
    long_about = "Upload Brazilian bank-statement PDFs to a cloud parsing service, classify the \
extracted text into typed transactions with an LLM, and resolve hard-to-identify issuers by \
voting over page images. Prints one JSON record per statement.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Statement PDF files, processed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// LLM model ID (e.g. gpt-4o).
    #[arg(long, env = "EXTRATO2LEDGER_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama.
    #[arg(long, env = "EXTRATO2LEDGER_PROVIDER")]
    provider: Option<String>,

    /// Base URL of the parsing service.
    #[arg(long, env = "EXTRATO2LEDGER_BASE_URL")]
    base_url: Option<String>,

    /// Page cap sent with each upload.
    #[arg(long, env = "EXTRATO2LEDGER_MAX_PAGES", default_value_t = 10)]
    max_pages: u32,

    /// Seconds between poll attempts while a parse job is processing.
    #[arg(long, env = "EXTRATO2LEDGER_POLL_INTERVAL", default_value_t = 10)]
    poll_interval: u64,

    /// Ceiling on total poll wait per job, in seconds.
    #[arg(long, env = "EXTRATO2LEDGER_POLL_TIMEOUT", default_value_t = 600)]
    poll_timeout: u64,

    /// Compact JSON output (default is pretty-printed).
    #[arg(long)]
    compact: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EXTRATO2LEDGER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the JSON records.
    #[arg(short, long, env = "EXTRATO2LEDGER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = PipelineConfig::builder()
        .max_pages(cli.max_pages)
        .poll_interval_secs(cli.poll_interval)
        .poll_timeout_secs(cli.poll_timeout);
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Read inputs ──────────────────────────────────────────────────────
    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement.pdf".to_string());
        files.push(StatementUpload::new(name, bytes));
    }

    // ── Run the batch ────────────────────────────────────────────────────
    let parser = LlamaParseClient::from_env(&config)?;
    let classifier = LlmClassifier::from_config(&config)?;
    let statements = format_batch(&parser, &classifier, files, &config)
        .await
        .context("Batch formatting failed")?;

    // ── Print records ────────────────────────────────────────────────────
    let records: Vec<serde_json::Value> = statements.iter().map(|s| s.to_record()).collect();
    let json = if cli.compact {
        serde_json::to_string(&records)
    } else {
        serde_json::to_string_pretty(&records)
    }
    .context("Failed to serialise statements")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(json.as_bytes())?;
    handle.write_all(b"\n")?;

    if !cli.quiet {
        let transactions: usize = statements.iter().map(|s| s.transactions.len()).sum();
        eprintln!(
            "Formatted {} statement(s), {} transaction(s)",
            statements.len(),
            transactions
        );
    }

    Ok(())
}
