//! Tag normalization for voice messages.
//!
//! Tags are typed freely by users (`#Work`, ` road trip `, `Café`), so every
//! tag goes through [`normalize_tag`] before it is stored or searched.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Maximum characters in a stored tag
pub const MAX_TAG_CHARS: usize = 32;

#[allow(clippy::expect_used)]
static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([\p{L}\p{N}_-]+)").expect("hashtag pattern compiles"));

#[allow(clippy::expect_used)]
static VALID_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}_-]+$").expect("tag pattern compiles"));

/// Normalize a user-entered tag.
///
/// Returns `None` when nothing valid is left or the result is too long.
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let stripped = raw.trim().trim_start_matches('#');
    let composed: String = stripped.to_lowercase().nfc().collect();
    let joined = composed.split_whitespace().collect::<Vec<_>>().join("-");

    if joined.is_empty() || joined.chars().count() > MAX_TAG_CHARS || !VALID_TAG.is_match(&joined) {
        return None;
    }
    Some(joined)
}

/// Append normalized `incoming` tags to `existing`, keeping first-seen order.
///
/// Returns the number of tags added. Invalid tags are skipped.
pub fn merge_tags<I, S>(existing: &mut Vec<String>, incoming: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut added = 0;
    for tag in incoming.into_iter().filter_map(|t| normalize_tag(t.as_ref())) {
        if !existing.contains(&tag) {
            existing.push(tag);
            added += 1;
        }
    }
    added
}

/// Find `#hashtags` in free text, e.g. a transcript.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    merge_tags(
        &mut tags,
        HASHTAG.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str()),
    );
    tags
}
