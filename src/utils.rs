//! Formatting helpers shared by previews, exports and the CLI.

/// Format a duration in milliseconds as `m:ss`.
///
/// Fractions of a second are dropped, matching the recorder's display.
#[must_use]
pub fn format_duration(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Truncate `text` to at most `max_chars` characters, appending `…` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
#[must_use]
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }

    let mut preview: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
    preview.truncate(preview.trim_end().len());
    preview.push('…');
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(999), "0:00");
        assert_eq!(format_duration(12_500), "0:12");
        assert_eq!(format_duration(61_000), "1:01");
        assert_eq!(format_duration(600_000), "10:00");
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_preview("  hi there ", 50), "hi there");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "a".repeat(80);
        let preview = truncate_preview(&text, 50);
        assert_eq!(preview.chars().count(), 50);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "héllo wörld ".repeat(10);
        let preview = truncate_preview(&text, 10);
        assert!(preview.chars().count() <= 10);
        assert!(preview.ends_with('…'));
    }
}
