const MAX_LOG_BODY_LENGTH: usize = 2_000;
const MAX_PREVIEW_LENGTH: usize = 80;

/// Cap a response body before it goes into a log line.
pub fn truncate_body(body: &str) -> String {
    truncate_chars(body, MAX_LOG_BODY_LENGTH)
}

/// One-line preview of a longer text, e.g. an email body in a listing.
pub fn preview(text: &str) -> String {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    truncate_chars(first_line, MAX_PREVIEW_LENGTH)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
