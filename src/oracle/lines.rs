//! Comment-stripping line filter shared by the oratab and override parsers.

/// Yield the meaningful part of each line in `text`.
///
/// Everything from the first `#` onwards is dropped, the remainder is
/// trimmed, and lines left empty are skipped.
pub fn strip_comments(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter_map(|line| {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            None
        } else {
            Some(content)
        }
    })
}
