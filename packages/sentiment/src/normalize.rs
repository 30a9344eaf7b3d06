//! Review text normalization.

/// Lowercases and collapses whitespace. Used for dedup keys and to drop
/// empty reviews.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lowercases, removes URLs, replaces everything outside `[a-z0-9']` and
/// whitespace with a space, and collapses whitespace. Used for issue
/// matching and phrase extraction.
#[must_use]
pub fn normalize_for_issues(text: &str) -> String {
    let without_urls = text
        .to_lowercase()
        .split_whitespace()
        .map(strip_url)
        .collect::<Vec<_>>()
        .join(" ");

    let kept: String = without_urls
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\'' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts a token at the first `http` or `www.` that has at least one more
/// character after it.
fn strip_url(token: &str) -> &str {
    let cut = ["http", "www."]
        .iter()
        .filter_map(|marker| {
            token
                .match_indices(marker)
                .find(|(idx, _)| token.len() > idx + marker.len())
                .map(|(idx, _)| idx)
        })
        .min();
    cut.map_or(token, |idx| &token[..idx])
}
