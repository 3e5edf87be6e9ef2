/// Bounds text length for inference prompts, roughly 4 characters per token.
///
/// Returns the (possibly shortened) text and whether anything was cut. When a
/// cut is needed, prefers ending on the last paragraph break, then the last
/// sentence-terminating period, as long as the break sits at or after 80% of
/// the limit; otherwise keeps the hard cut.
pub fn truncate_content(content: &str, max_chars: usize) -> (String, bool) {
    if content.chars().count() <= max_chars {
        return (content.to_string(), false);
    }

    let mut truncated: String = content.chars().take(max_chars).collect();
    let threshold = max_chars * 4 / 5;

    if let Some(cut) = rewind_point(&truncated, threshold) {
        truncated.truncate(cut);
    }

    (truncated, true)
}

/// Byte position to cut at, or None to keep the hard cut.
fn rewind_point(truncated: &str, threshold_chars: usize) -> Option<usize> {
    if let Some(pos) = truncated.rfind("\n\n") {
        if chars_up_to(truncated, pos) >= threshold_chars {
            return Some(pos);
        }
    }
    if let Some(pos) = truncated.rfind('.') {
        if chars_up_to(truncated, pos) >= threshold_chars {
            return Some(pos + 1);
        }
    }
    None
}

fn chars_up_to(text: &str, byte_pos: usize) -> usize {
    text[..byte_pos].chars().count()
}
