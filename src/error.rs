//! Error types for the extrato2ledger library.
//!
//! Everything in this enum is **fatal for the batch**: the formatter makes no
//! attempt at per-file recovery, so any error raised while processing one
//! statement aborts the whole `format_batch` call with no partial results.
//! The only retry anywhere in the pipeline is the poll/backoff loop in
//! [`crate::pipeline::poll`], and even that is bounded by a deadline.
//!
//! Callers mapping these to an HTTP boundary should treat every variant as a
//! 5xx-class failure; input validation (e.g. "no files supplied") belongs to
//! the caller and never reaches this crate.

use thiserror::Error;

/// All errors returned by the extrato2ledger library.
#[derive(Debug, Error)]
pub enum ExtratoError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The parsing-service credential is missing from the environment.
    #[error("Parsing credential is not configured: the '{var}' environment variable is unset.\nGet a key at https://cloud.llamaindex.ai and export {var}=llx-...")]
    MissingCredential { var: String },

    /// The configured LLM provider could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Parsing-service errors ────────────────────────────────────────────
    /// The remote service rejected or failed the statement upload.
    #[error("Statement upload failed (HTTP {status}): {detail}")]
    Submission { status: u16, detail: String },

    /// A job result (text, page manifest, or page image) could not be retrieved.
    #[error("Failed to retrieve {resource}: {detail}")]
    Retrieval { resource: String, detail: String },

    /// The parse job did not produce text before the configured deadline.
    #[error("Parse job '{job}' still pending after {secs}s.\nRaise PipelineConfig::poll_timeout_secs for very large statements.")]
    PollTimeout { job: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The LLM call failed, or its reply did not match the statement schema.
    #[error("Statement extraction failed: {detail}")]
    Extraction { detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_variable() {
        let e = ExtratoError::MissingCredential {
            var: "LLAMA_CLOUD_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("LLAMA_CLOUD_API_KEY"), "got: {msg}");
    }

    #[test]
    fn submission_display_carries_status() {
        let e = ExtratoError::Submission {
            status: 422,
            detail: "file too large".into(),
        };
        assert!(e.to_string().contains("422"));
        assert!(e.to_string().contains("file too large"));
    }

    #[test]
    fn poll_timeout_display() {
        let e = ExtratoError::PollTimeout {
            job: "job-17".into(),
            secs: 600,
        };
        assert!(e.to_string().contains("job-17"));
        assert!(e.to_string().contains("600s"));
    }

    #[test]
    fn retrieval_display_names_resource() {
        let e = ExtratoError::Retrieval {
            resource: "page manifest".into(),
            detail: "HTTP 500".into(),
        };
        assert!(e.to_string().contains("page manifest"));
    }
}
