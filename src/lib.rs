//! # flashgen
//!
//! Turn course material into a study package: flashcards, multiple-choice
//! questions (QCM) and a structured revision sheet, generated by an LLM from
//! pasted text or an uploaded PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text / PDF
//!  │
//!  ├─ 1. Input      validate the PDF (magic bytes, permissions)
//!  ├─ 2. Extract    text + page images via pdfium (spawn_blocking)
//!  ├─ 3. Truncate   clamp to the character budget at a sentence end
//!  ├─ 4. Prompt     one instruction with the exact counts and JSON shape
//!  ├─ 5. LLM        a single JSON-mode chat completion, no retry
//!  └─ 6. Normalize  back-fill, attach images, pad to the requested count
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashgen::{generate_notes, resolve_backend, GenerationConfig, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MISTRAL_API_KEY
//!     let config = GenerationConfig::default();
//!     let backend = resolve_backend(&config)?;
//!     let request = GenerationRequest::new("Photosynthesis converts light…", 20, 15);
//!     let output = generate_notes(&request, backend.as_ref(), &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flashgen` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, ServerConfig, ServerConfigBuilder};
pub use error::FlashGenError;
pub use export::{is_valid_image_ref, to_anki, to_markdown, ExportFormat};
pub use generate::{generate_from_pdf, generate_notes, ImageTarget};
pub use output::{
    Definition, Flashcard, GenerationOutput, GenerationRequest, GenerationResult, QcmQuestion,
    RevisionSheet, TokenUsage,
};
pub use pipeline::extract::{DocumentExtractor, PdfiumExtractor};
pub use pipeline::llm::{resolve_backend, GenerationBackend, MistralBackend, ProviderBackend};
