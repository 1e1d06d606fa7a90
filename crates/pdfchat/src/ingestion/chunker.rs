//! Fixed-window text chunking

/// Split text into trimmed fixed-size windows.
///
/// Walks the text in windows of `size` characters. Each window is trimmed and
/// empty windows are dropped. The next window starts at
/// `max(previous_end - overlap, previous_end)`, so the scan never regresses
/// past the prior window's end and always terminates, even when `overlap` is
/// close to `size`.
///
/// Callers must pass `size > 0` and `overlap < size`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    // Character boundaries, so windows never split a multi-byte character.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total = bounds.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let end = (start + size).min(total);
        let byte_start = bounds[start];
        let byte_end = if end == total { text.len() } else { bounds[end] };

        let window = text[byte_start..byte_end].trim();
        if !window.is_empty() {
            chunks.push(window.to_string());
        }

        if end == total {
            break;
        }
        start = (end - overlap).max(end);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 100, 10).is_empty());
    }

    #[test]
    fn short_text_is_one_trimmed_chunk() {
        let chunks = chunk_text("  hello world  ", 100, 10);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn windows_always_advance_with_maximal_overlap() {
        // overlap = size - 1 must not loop forever
        let text = "abcdefghij".repeat(20);
        let chunks = chunk_text(&text, 10, 9);
        assert_eq!(chunks.len(), 20);
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let text = format!("{}{}{}", "a".repeat(10), " ".repeat(10), "b".repeat(10));
        let chunks = chunk_text(&text, 10, 3);
        assert_eq!(chunks, vec!["a".repeat(10), "b".repeat(10)]);
    }

    #[test]
    fn windows_cover_the_whole_text() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let chunks = chunk_text(&text, 800, 150);
        // The scan never regresses, so concatenation reconstructs the source.
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.len(), 4); // ceil(2500 / 800)
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let text = "é".repeat(25);
        let chunks = chunk_text(&text, 10, 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[2].chars().count(), 5);
    }
}
