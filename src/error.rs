//! Error types for the parsegen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AgentError`] — **Fatal**: the run cannot proceed at all (sample files
//!   missing, target CSV unreadable, no generator configured). Returned as
//!   `Err(AgentError)` from [`crate::agent::run`] before the loop starts.
//!
//! * [`AttemptError`] — **Non-fatal**: one generate-and-test cycle failed
//!   (transport error from the completion service, the generated parser
//!   crashed, its output missed the target schema). Captured inside an
//!   [`crate::report::AttemptRecord`] and fed verbatim into the next
//!   attempt's prompt as corrective feedback.
//!
//! The separation is the loop's failure contract: everything an attempt can
//! do wrong is recoverable feedback; only the preconditions of the run are
//! allowed to abort it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the parsegen library.
///
/// Per-attempt failures use [`AttemptError`] and are folded into the
/// correction loop rather than propagated here.
#[derive(Debug, Error)]
pub enum AgentError {
    // ── Sample errors ─────────────────────────────────────────────────────
    /// An expected sample file (PDF or CSV) is absent for the target bank.
    #[error("Missing sample file for '{bank}': '{path}'\nExpected <data-dir>/{bank}/{bank}_sample.pdf and {bank}_sample.csv.")]
    MissingSample { bank: String, path: PathBuf },

    /// The target CSV exists but cannot be parsed into a table.
    #[error("Invalid sample CSV '{path}': {detail}")]
    InvalidSample { path: PathBuf, detail: String },

    // ── Generator errors ──────────────────────────────────────────────────
    /// No code-generation provider could be constructed.
    #[error("Code generator '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of a single attempt.
///
/// Stored in [`crate::report::AttemptRecord`] when an attempt fails; its
/// `Display` text is the literal feedback embedded in the next prompt, so
/// every variant keeps the underlying message verbatim.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AttemptError {
    /// The completion service failed or returned unusable output.
    #[error("code generation failed: {detail}")]
    Generation { detail: String },

    /// The generated parser failed to load or raised during execution.
    #[error("parser execution failed: {detail}")]
    Execution { detail: String },

    /// The parser ran, but its output missed the target schema.
    #[error("output does not match the target format: {detail}")]
    SchemaMismatch { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sample_display_names_both_files() {
        let e = AgentError::MissingSample {
            bank: "icici".into(),
            path: PathBuf::from("data/icici/icici_sample.csv"),
        };
        let msg = e.to_string();
        assert!(msg.contains("icici_sample.csv"), "got: {msg}");
        assert!(msg.contains("icici_sample.pdf"), "got: {msg}");
    }

    #[test]
    fn execution_error_keeps_message_verbatim() {
        let e = AttemptError::Execution {
            detail: "NameError: name 'pdfplumber' is not defined".into(),
        };
        assert!(e
            .to_string()
            .contains("NameError: name 'pdfplumber' is not defined"));
    }

    #[test]
    fn schema_mismatch_display() {
        let e = AttemptError::SchemaMismatch {
            detail: "column order differs".into(),
        };
        assert!(e.to_string().contains("column order differs"));
        assert!(e.to_string().contains("target format"));
    }
}
