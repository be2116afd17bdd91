//! Error types for the edgequake-pdf2deck library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`Pdf2DeckError`] — **Fatal**: the caller broke a precondition (not
//!   enough text, bad configuration, no provider) or an I/O step at the
//!   rendering boundary failed. Returned as `Err(Pdf2DeckError)`.
//!
//! * [`StructureIssue`] — **Recovered**: the candidate structure could not
//!   be used (bad JSON, wrong top-level type, nothing returned). The outline
//!   is rebuilt heuristically and the issue is recorded in
//!   [`crate::pipeline::normalize::OutlineSource`].
//!
//! * [`AnalyzerError`] — **Recovered**: the structure analyzer collaborator
//!   failed. The pipeline continues on the heuristic path.
//!
//! Malformed *content* never becomes a fatal error. The worst case is an
//! outline titled with the document name and no sections.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2deck library.
#[derive(Debug, Error)]
pub enum Pdf2DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The extracted text is too short to build a presentation from.
    #[error("Extracted text is too short ({chars} chars, need at least {min}).\nIs the PDF scanned or image-only?")]
    InsufficientText { chars: usize, min: usize },

    /// An image file could not be opened or probed for dimensions.
    #[error("Failed to read image '{path}': {detail}")]
    ImageReadFailed { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The renderer collaborator rejected the plan.
    #[error("Rendering failed: {detail}")]
    RenderFailed { detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a candidate structure was discarded in favour of the heuristic outline.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum StructureIssue {
    /// The candidate text was not parseable JSON, even after repair.
    #[error("candidate is not valid JSON: {detail}")]
    InvalidJson { detail: String },

    /// The candidate parsed, but the top-level value is not an object.
    #[error("candidate is a JSON {found}, expected an object")]
    NotAnObject { found: String },

    /// No candidate was produced at all.
    #[error("no candidate structure was provided")]
    NoCandidate,
}

/// A non-fatal failure of the structure analyzer collaborator.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AnalyzerError {
    /// The analyzer is deliberately disabled (offline mode).
    #[error("structure analyzer is unavailable")]
    Unavailable,

    /// The LLM call failed after retries.
    #[error("LLM call failed after {retries} retries: {detail}")]
    Llm { retries: u32, detail: String },

    /// The LLM call did not answer in time.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The LLM answered with nothing usable.
    #[error("LLM returned an empty reply")]
    EmptyReply,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_text_display() {
        let e = Pdf2DeckError::InsufficientText { chars: 12, min: 50 };
        let msg = e.to_string();
        assert!(msg.contains("12 chars"), "got: {msg}");
        assert!(msg.contains("50"), "got: {msg}");
    }

    #[test]
    fn not_an_object_display() {
        let e = StructureIssue::NotAnObject {
            found: "array".into(),
        };
        assert!(e.to_string().contains("JSON array"));
    }

    #[test]
    fn analyzer_llm_display() {
        let e = AnalyzerError::Llm {
            retries: 3,
            detail: "HTTP 503".into(),
        };
        assert!(e.to_string().contains("3 retries"));
        assert!(e.to_string().contains("HTTP 503"));
    }

    #[test]
    fn analyzer_timeout_display() {
        let e = AnalyzerError::Timeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Pdf2DeckError::OutputWriteFailed {
            path: PathBuf::from("/tmp/deck.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("deck.md"));
    }
}
