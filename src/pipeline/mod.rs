//! Pipeline stages for statement-to-ledger formatting.
//!
//! Each submodule implements exactly one stage. Keeping stages separate makes
//! each independently testable and lets the formatter's tests swap the two
//! network-facing seams ([`parse::ParseService`], [`llm::Classifier`]) for
//! in-memory fakes.
//!
//! ## Data Flow
//!
//! ```text
//! parse ──▶ poll ──▶ llm ──▶ (weak bank?) images ──▶ llm ──▶ disambiguate
//! (upload)  (await)  (text→Statement)     (≤3 crops) (logo)  (plurality vote)
//! ```
//!
//! 1. [`parse`] — upload the PDF and talk to the job's result endpoints
//! 2. [`poll`] — sleep-and-retry until the job's text is ready, with a deadline
//! 3. [`llm`] — classify text into a [`crate::schema::Statement`], or an
//!    image into a [`crate::schema::BankCandidate`]
//! 4. [`images`] — pick and download the candidate page images for the vote
//! 5. [`disambiguate`] — settle a weak bank candidate by plurality vote

pub mod disambiguate;
pub mod images;
pub mod llm;
pub mod parse;
pub mod poll;
