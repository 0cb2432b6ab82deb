//! Batch formatting: the orchestration that turns uploaded statement PDFs
//! into finalised [`Statement`]s.
//!
//! ## Failure semantics
//!
//! The batch is **all-or-nothing**: files are processed strictly in input
//! order and the first error aborts the whole call with no partial results.
//! Callers that want per-file recovery must split the batch themselves.
//! Sequential processing is deliberate — the fallback path depends on the
//! completed result of the same file's earlier calls, and every stage is a
//! paid remote invocation.

use crate::config::PipelineConfig;
use crate::error::ExtratoError;
use crate::pipeline::{disambiguate, llm::Classifier, parse::ParseService, poll};
use crate::schema::Statement;
use std::time::Instant;
use tracing::{debug, info};

/// One uploaded statement file, as received from the HTTP boundary.
#[derive(Debug, Clone)]
pub struct StatementUpload {
    /// File name forwarded to the parsing service.
    pub name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl StatementUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Format a batch of uploaded statements, sequentially and in input order.
///
/// Returns one [`Statement`] per file, 1:1 and in the same order. Any
/// failure — submission, polling, extraction, or the image vote — aborts the
/// entire batch.
///
/// # Example
/// ```rust,no_run
/// use extrato2ledger::{format_batch, LlamaParseClient, LlmClassifier, PipelineConfig, StatementUpload};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::default();
/// let parser = LlamaParseClient::from_env(&config)?;
/// let classifier = LlmClassifier::from_config(&config)?;
///
/// let files = vec![StatementUpload::new("march.pdf", std::fs::read("march.pdf")?)];
/// let statements = format_batch(&parser, &classifier, files, &config).await?;
/// println!("{} statements", statements.len());
/// # Ok(())
/// # }
/// ```
pub async fn format_batch<P, C>(
    service: &P,
    classifier: &C,
    files: Vec<StatementUpload>,
    config: &PipelineConfig,
) -> Result<Vec<Statement>, ExtratoError>
where
    P: ParseService + ?Sized,
    C: Classifier + ?Sized,
{
    let start = Instant::now();
    let total = files.len();
    info!("Formatting batch of {} statement file(s)", total);

    let mut statements = Vec::with_capacity(total);
    for (index, file) in files.into_iter().enumerate() {
        debug!("File {}/{}: '{}'", index + 1, total, file.name);
        let statement = format_file(service, classifier, file, config).await?;
        statements.push(statement);
    }

    info!(
        "Batch complete: {} statement(s) in {}ms",
        statements.len(),
        start.elapsed().as_millis()
    );
    Ok(statements)
}

/// Format a single uploaded statement.
///
/// The four stages of the per-file flow, in order: submit, poll for text,
/// extract the typed statement, and — only when the bank candidate is weak —
/// the page-image vote.
pub async fn format_file<P, C>(
    service: &P,
    classifier: &C,
    file: StatementUpload,
    config: &PipelineConfig,
) -> Result<Statement, ExtratoError>
where
    P: ParseService + ?Sized,
    C: Classifier + ?Sized,
{
    // ── Step 1: Submit ───────────────────────────────────────────────────
    let job = service.submit(file.bytes, &file.name).await?;

    // ── Step 2: Await parsed text ────────────────────────────────────────
    let text = poll::await_text(service, &job, config).await?;

    // ── Step 3: Extract the typed statement ──────────────────────────────
    let mut statement = classifier.classify_text(&text).await?;
    debug!(
        "'{}': {} transactions, bank {:?} ({:.2})",
        file.name,
        statement.transactions.len(),
        statement.bank.bank,
        statement.bank.score
    );

    // ── Step 4: Image vote, only for weak bank candidates ────────────────
    if !statement.bank.is_confident(config.confidence_threshold) {
        info!(
            "'{}': weak bank candidate {:?} ({:.2}), trying page-image vote",
            file.name, statement.bank.bank, statement.bank.score
        );
        disambiguate::resolve_bank(service, classifier, &job, &mut statement, config).await?;
    }

    Ok(statement)
}
