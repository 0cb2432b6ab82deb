//! # extrato2ledger
//!
//! Turn Brazilian bank-statement ("extrato") PDFs into typed transaction
//! ledgers using a cloud document parser and LLM classification.
//!
//! ## Why this crate?
//!
//! Statement PDFs have no common layout — each bank prints dates, amounts,
//! and descriptions its own way, and many statements are scans. Instead of
//! maintaining one parser per bank, this crate sends the PDF to a remote
//! parsing service for text extraction and lets an LLM classify the text into
//! a fixed schema: signed amounts, transaction channels (PIX, transfer,
//! card, …), spending categories, and the issuing bank. When the text does
//! not give the bank away, page images are classified visually and the banks
//! they show are put to a plurality vote.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Submit       upload to the parsing service, get a job id
//!  ├─ 2. Poll         sleep/retry until the job's text is ready (deadline-bounded)
//!  ├─ 3. Extract      LLM classifies the text into a typed Statement
//!  ├─ 4. Disambiguate weak bank candidate? classify ≤3 page images, majority wins
//!  └─ 5. Output       finalised Statements, 1:1 with the uploaded files
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extrato2ledger::{
//!     format_batch, LlamaParseClient, LlmClassifier, PipelineConfig, StatementUpload,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials: LLAMA_CLOUD_API_KEY for parsing, OPENAI_API_KEY (or
//!     // another provider key) for classification.
//!     let config = PipelineConfig::default();
//!     let parser = LlamaParseClient::from_env(&config)?;
//!     let classifier = LlmClassifier::from_config(&config)?;
//!
//!     let files = vec![StatementUpload::new("march.pdf", std::fs::read("march.pdf")?)];
//!     let statements = format_batch(&parser, &classifier, files, &config).await?;
//!
//!     for statement in &statements {
//!         println!(
//!             "{:?}: {} transactions in {}",
//!             statement.bank.bank,
//!             statement.transactions.len(),
//!             statement.statement_month
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! A batch is all-or-nothing: the first error on any file aborts the whole
//! call (see [`crate::error::ExtratoError`]). The only retry in the pipeline
//! is the bounded poll loop waiting for the parsing service.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `extrato2ledger` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! extrato2ledger = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{format_batch, format_file, StatementUpload};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::ExtratoError;
pub use pipeline::llm::{Classifier, LlmClassifier};
pub use pipeline::parse::{JobId, LlamaParseClient, ParseService, TextResult};
pub use schema::{Bank, BankCandidate, Category, Channel, Statement, Transaction};
