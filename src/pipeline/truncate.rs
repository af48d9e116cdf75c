//! Source-text truncation to a character budget.
//!
//! The budget is counted in Unicode scalar values, not bytes, so a cut never
//! lands inside a multi-byte character. When the cut would leave a dangling
//! half-sentence, the text is pulled back to the last sentence end, provided
//! that end is close enough to the budget (last 20 %) that little content is
//! lost.

use std::borrow::Cow;

const SENTENCE_ENDS: [char; 3] = ['.', '?', '!'];

/// Share of the budget below which a sentence boundary is ignored.
const BOUNDARY_FLOOR: f64 = 0.8;

/// Clamp `text` to at most `budget` characters.
///
/// Returns the input unchanged (borrowed) when it already fits.
pub fn truncate_text(text: &str, budget: usize) -> Cow<'_, str> {
    let cut = match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => byte_idx,
        None => return Cow::Borrowed(text),
    };
    let prefix = &text[..cut];

    if let Some(pos) = prefix.rfind(SENTENCE_ENDS) {
        let char_pos = prefix[..pos].chars().count();
        if char_pos as f64 > budget as f64 * BOUNDARY_FLOOR {
            // All sentence-end markers are one byte wide.
            return Cow::Owned(prefix[..=pos].to_string());
        }
    }

    Cow::Owned(prefix.to_string())
}

/// True when `truncate_text` would shorten `text`.
pub fn exceeds_budget(text: &str, budget: usize) -> bool {
    text.chars().nth(budget).is_some()
}
