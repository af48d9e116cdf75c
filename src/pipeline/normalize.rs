//! Response repair: turn the model's raw JSON into a complete
//! [`GenerationResult`].
//!
//! Even with JSON-object mode and an explicit schema in the prompt, models
//! drop optional sections, emit `null` instead of an empty list, or stop a
//! few flashcards short. Those gaps are repaired here, deterministically,
//! and reported so the caller can surface a warning. A response that is not
//! JSON at all is *not* repaired: it is a generation failure.
//!
//! ## Step order
//!
//! 1. Strip wrapper noise (BOM, outer code fence) and parse.
//! 2. Record which optional revision fields were absent (serde already
//!    substituted their empty defaults).
//! 3. Splice caller-supplied images into the revision sheet and the first
//!    `floor(n × ratio)` flashcards. `n` is the model's own count, taken
//!    before padding.
//! 4. Pad flashcards up to the requested count. Extras are kept.

use crate::error::FlashGenError;
use crate::output::{Flashcard, GenerationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Sentence prepended to the introduction when images were spliced in.
pub const IMAGE_DISCLAIMER: &str =
    "Note: images extracted from the document were added automatically to this sheet.";

/// Answer text of padding flashcards.
pub const PLACEHOLDER_ANSWER: &str =
    "Answer generated automatically to reach the requested number of flashcards.";

/// Optional revision fields, in the order they are reported.
const OPTIONAL_REVISION_FIELDS: [&str; 12] = [
    "introduction",
    "summary",
    "definitions",
    "methodology",
    "examples",
    "practical_applications",
    "key_points",
    "must_know",
    "conclusion",
    "tips",
    "structure",
    "images",
];

/// What the normalizer had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Revision fields that were absent or null in the model output.
    pub backfilled_fields: Vec<String>,
    /// Number of placeholder flashcards appended.
    pub padded_flashcards: usize,
    /// Number of flashcards that received an image.
    pub images_attached: usize,
}

/// A repaired result and the record of repairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub result: GenerationResult,
    pub report: NormalizeReport,
}

/// Parse and repair a raw model response.
///
/// `image_ratio` is the upper share of flashcards that receive an image
/// (0.3 by default).
pub fn normalize_response(
    raw: &str,
    flashcard_count: usize,
    images: &[String],
    image_ratio: f64,
) -> Result<Normalized, FlashGenError> {
    let cleaned = strip_wrappers(raw);

    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        warn!("Model output is not valid JSON: {}", e);
        FlashGenError::MalformedJson {
            detail: e.to_string(),
        }
    })?;

    let backfilled_fields = missing_revision_fields(&value);

    let mut result: GenerationResult = serde_json::from_value(value).map_err(|e| {
        warn!("Model output does not match the expected shape: {}", e);
        FlashGenError::MalformedJson {
            detail: e.to_string(),
        }
    })?;

    debug!(
        "Model returned {} flashcards, {} QCM",
        result.flashcards.len(),
        result.qcm.len()
    );

    let images_attached = attach_images(&mut result, images, image_ratio);
    let padded_flashcards = pad_flashcards(&mut result.flashcards, flashcard_count);

    Ok(Normalized {
        result,
        report: NormalizeReport {
            backfilled_fields,
            padded_flashcards,
            images_attached,
        },
    })
}

// ── Step 1: wrapper noise ────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_wrappers(raw: &str) -> &str {
    let trimmed = raw.trim_start_matches('\u{FEFF}').trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

// ── Step 2: back-filled fields ───────────────────────────────────────────

fn missing_revision_fields(value: &Value) -> Vec<String> {
    let Some(revision) = value.get("revision").and_then(Value::as_object) else {
        return Vec::new();
    };
    OPTIONAL_REVISION_FIELDS
        .into_iter()
        .filter(|field| revision.get(*field).is_none_or(Value::is_null))
        .map(|field| field.to_string())
        .collect()
}

// ── Step 3: images ───────────────────────────────────────────────────────

/// Attach images round-robin to the leading flashcards. Returns the number of
/// cards that received one.
fn attach_images(result: &mut GenerationResult, images: &[String], ratio: f64) -> usize {
    if images.is_empty() {
        return 0;
    }

    result.revision.images = images.to_vec();

    let by_ratio = (result.flashcards.len() as f64 * ratio).floor() as usize;
    let k = by_ratio.min(images.len());
    for (i, card) in result.flashcards.iter_mut().take(k).enumerate() {
        card.image = Some(images[i % images.len()].clone());
    }

    if !result.revision.introduction.contains(IMAGE_DISCLAIMER) {
        result.revision.introduction =
            format!("{} \n\n{}", IMAGE_DISCLAIMER, result.revision.introduction);
    }

    k
}

// ── Step 4: padding ──────────────────────────────────────────────────────

/// A numbered placeholder card. `position` is 1-based.
pub fn placeholder_flashcard(position: usize) -> Flashcard {
    Flashcard {
        question: format!("Additional question {position}?"),
        answer: PLACEHOLDER_ANSWER.to_string(),
        image: None,
    }
}

/// True for cards produced by [`placeholder_flashcard`].
pub fn is_placeholder(card: &Flashcard) -> bool {
    card.answer == PLACEHOLDER_ANSWER
}

fn pad_flashcards(cards: &mut Vec<Flashcard>, requested: usize) -> usize {
    let have = cards.len();
    if have >= requested {
        return 0;
    }
    warn!(
        "Model produced {} flashcards instead of the {} requested; padding",
        have, requested
    );
    cards.extend((have..requested).map(|i| placeholder_flashcard(i + 1)));
    requested - have
}
