//! Error types for the flashgen library.
//!
//! Everything that stops a generation is a [`FlashGenError`]. Conditions the
//! pipeline can repair on its own (truncated input, missing revision fields,
//! too few flashcards) are *not* errors: they are folded into the `warning`
//! of [`crate::output::GenerationOutput`] instead.
//!
//! The variants fall into four groups that map onto HTTP status codes in
//! [`crate::server::error`]:
//!
//! * caller errors (missing text, missing file, oversized input) → 400 / 413
//! * model errors (transport, empty response, malformed JSON) → 500
//! * PDF errors (unreadable file, pdfium binding) → 500
//! * configuration errors → reported at startup

use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the flashgen library.
#[derive(Debug, Error)]
pub enum FlashGenError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The source text exceeds the hard input limit.
    #[error(
        "The source text is too large to process ({len} characters, limit {max}).\n\
Use a shorter text or split it into several parts."
    )]
    InputTooLarge { len: usize, max: usize },

    /// `/generate` was called without any text.
    #[error("Text is required")]
    MissingText,

    /// `/upload-pdf` was called without a `pdf` field.
    #[error("No PDF file provided")]
    MissingPdf,

    /// The request body could not be interpreted.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// Network failure or non-success HTTP status from the model API.
    #[error("LLM API request failed: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<Value>,
    },

    /// The model API rejected the prompt as too large for its context window.
    #[error(
        "The source text is too large for the model's context window.\n\
Reduce the text or split it into several parts."
    )]
    ModelContextExceeded { body: Option<Value> },

    /// The model API answered but carried no content.
    #[error("LLM API returned an empty response")]
    EmptyResponse,

    /// The model's content is not the JSON document we asked for.
    #[error("Model response has an invalid format: {detail}")]
    MalformedJson { detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Text could not be extracted from the PDF.
    #[error("Unable to extract text from PDF '{path}': {detail}")]
    Extraction { path: PathBuf, detail: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium for your platform, or set PDFIUM_LIB_PATH to the directory\n\
(or file) containing libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configured provider could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlashGenError {
    /// Payload for the `details` field of an error response.
    ///
    /// Model errors carry the upstream body when one was returned so the
    /// client can see what the provider actually said.
    pub fn details(&self) -> Value {
        match self {
            FlashGenError::InputTooLarge { len, max } => {
                json!({ "inputLength": len, "maxAllowed": max })
            }
            FlashGenError::Transport {
                message,
                status,
                body,
            } => match body {
                Some(body) => body.clone(),
                None => json!({ "message": message, "status": status }),
            },
            FlashGenError::ModelContextExceeded { body } => body.clone().unwrap_or(Value::Null),
            FlashGenError::MalformedJson { detail } => Value::String(detail.clone()),
            FlashGenError::Extraction { detail, .. } => Value::String(detail.clone()),
            other => Value::String(other.to_string()),
        }
    }

    /// True when the failure is the caller's fault rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FlashGenError::InputTooLarge { .. }
                | FlashGenError::MissingText
                | FlashGenError::MissingPdf
                | FlashGenError::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_too_large_display() {
        let e = FlashGenError::InputTooLarge {
            len: 400_001,
            max: 400_000,
        };
        let msg = e.to_string();
        assert!(msg.contains("400001"), "got: {msg}");
        assert!(msg.contains("400000"), "got: {msg}");
    }

    #[test]
    fn transport_details_prefer_upstream_body() {
        let e = FlashGenError::Transport {
            message: "HTTP 503".into(),
            status: Some(503),
            body: Some(json!({ "message": "overloaded" })),
        };
        assert_eq!(e.details()["message"], "overloaded");
    }

    #[test]
    fn transport_details_without_body() {
        let e = FlashGenError::Transport {
            message: "connection refused".into(),
            status: None,
            body: None,
        };
        let details = e.details();
        assert_eq!(details["message"], "connection refused");
        assert!(details["status"].is_null());
    }

    #[test]
    fn malformed_json_details_is_parser_message() {
        let e = FlashGenError::MalformedJson {
            detail: "expected value at line 1 column 1".into(),
        };
        assert_eq!(e.details(), json!("expected value at line 1 column 1"));
    }

    #[test]
    fn client_errors_are_flagged() {
        assert!(FlashGenError::MissingText.is_client_error());
        assert!(FlashGenError::MissingPdf.is_client_error());
        assert!(!FlashGenError::EmptyResponse.is_client_error());
        assert!(!FlashGenError::Internal("x".into()).is_client_error());
    }
}
