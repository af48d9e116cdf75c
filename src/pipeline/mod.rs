//! Pipeline stages for study-package generation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested alone and swapped (another model backend, another PDF library)
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ truncate ──▶ llm ──▶ normalize
//! (magic)   (pdfium)    (budget)     (JSON)  (repair)
//!              │
//!              └──▶ encode (page JPEGs)
//! ```
//!
//! 1. [`input`]    : check that an uploaded file is a readable PDF
//! 2. [`extract`]  : pull text and page images out of the PDF; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]   : write rendered pages as JPEG files
//! 4. [`truncate`] : clamp the source text to the character budget
//! 5. [`llm`]      : the single model call; the only stage with network I/O
//! 6. [`normalize`]: parse the model JSON, back-fill, attach images, pad

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod truncate;
