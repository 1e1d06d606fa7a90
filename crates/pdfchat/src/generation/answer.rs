//! Final-answer extraction from raw model text

use once_cell::sync::Lazy;
use regex::Regex;

/// Returned when the model produced nothing usable.
pub const INCOMPLETE_ANSWER: &str =
    "I couldn't generate a complete answer. Please try again.";

static ANSWER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Answer:\s*(.+)").expect("answer marker regex"));

/// Extract the human-readable answer from raw model output.
///
/// Prefers the text after an `Answer:` marker (case-insensitive, searched
/// across the whole payload). Degenerate remainders fall back to the full
/// trimmed text when it is long enough, otherwise to a fixed placeholder.
/// Marker-less responses of two words or fewer are treated as incomplete.
pub fn extract_final_answer(raw: &str) -> String {
    if let Some(captures) = ANSWER_MARKER.captures(raw) {
        let after = captures.get(1).map(|m| m.as_str()).unwrap_or_default().trim();
        if after.is_empty() || after.eq_ignore_ascii_case("Answer") {
            // Model returned only the label; fall back to the full response.
            let cleaned = raw.trim();
            if cleaned.len() > 10 {
                return cleaned.to_string();
            }
            return INCOMPLETE_ANSWER.to_string();
        }
        return after.to_string();
    }

    let trimmed = raw.trim();
    if trimmed.split_whitespace().count() <= 2 {
        return INCOMPLETE_ANSWER.to_string();
    }

    trimmed.to_string()
}
