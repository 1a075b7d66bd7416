use songlib_dal::Pagination;

/// Blank line separates verses, single line break stays within a verse
pub const VERSE_SEPARATOR: &str = "\n\n";

/// Splits lyrics into verses, missing or empty text is a single empty verse.
pub fn split_verses(text: Option<&str>) -> Vec<&str> {
    text.unwrap_or_default().split(VERSE_SEPARATOR).collect()
}

/// Page of verses selected by already resolved `pagination`
pub fn page_verses(text: Option<&str>, pagination: Pagination) -> (Vec<String>, Pagination) {
    let verses = split_verses(text);
    let (page, pagination) = pagination.slice(verses.as_slice());
    (page.iter().map(|v| v.to_string()).collect(), pagination)
}
