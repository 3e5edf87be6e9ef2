use lazy_static::lazy_static;
use regex::Regex;

const MAX_TITLE_CHARS: usize = 200;

lazy_static! {
    static ref MULTI_SPACE: Regex = Regex::new(r" {3,}").unwrap();
    static ref MULTI_NEWLINE: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Normalizes text extracted from web pages: one line-break style, no runs of
/// 3+ spaces or newlines, trimmed ends.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = MULTI_SPACE.replace_all(&text, "  ");
    let text = MULTI_NEWLINE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Derives a title from cleaned content when the page offers none: the first
/// non-empty line, capped at 200 characters on a word boundary with an
/// ellipsis marker when cut.
pub fn extract_title_from_content(content: &str) -> String {
    let first_line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if first_line.is_empty() {
        return "Untitled Article".to_string();
    }

    if first_line.chars().count() <= MAX_TITLE_CHARS {
        return first_line.to_string();
    }

    let cut: String = first_line.chars().take(MAX_TITLE_CHARS).collect();
    let cut = match cut.rsplit_once(' ') {
        Some((head, _)) => head.to_string(),
        None => cut,
    };
    format!("{}...", cut.trim_end())
}
