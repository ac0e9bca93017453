//! Filesystem-safe filenames for downloaded papers.

/// Longest filename stem produced, in characters.
pub const MAX_STEM_CHARS: usize = 200;

/// Derive a `.pdf` filename from a paper title, falling back to the last
/// path segment of its link when the title has nothing usable.
///
/// Only word characters, hyphens, underscores, periods and spaces survive
/// from the title or the link segment.
pub fn safe_filename(title: &str, href: &str) -> String {
    if !title.trim().is_empty() {
        let cleaned: String = title.chars().filter(|&c| is_allowed(c)).collect();
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            return format!("{}.pdf", truncate_chars(cleaned, MAX_STEM_CHARS));
        }
    }

    let last_segment: String = href
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|&c| is_allowed(c))
        .collect();
    format!("{}.pdf", truncate_chars(&last_segment, MAX_STEM_CHARS))
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ')
}

/// First `max` characters of `s` (UTF-8 safe).
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_cleaned() {
        assert_eq!(
            safe_filename("Attention: Is It All You Need?", "https://x/papers/1"),
            "Attention Is It All You Need.pdf"
        );
        assert_eq!(
            safe_filename("  GPT-4o_mini v1.5  ", "https://x/papers/1"),
            "GPT-4o_mini v1.5.pdf"
        );
    }

    #[test]
    fn test_fallback_to_href() {
        assert_eq!(
            safe_filename("", "https://huggingface.co/papers/2403.01234"),
            "2403.01234.pdf"
        );
        assert_eq!(
            safe_filename("   ", "https://huggingface.co/papers/2403.01234"),
            "2403.01234.pdf"
        );
        assert_eq!(
            safe_filename("?!/:*", "https://huggingface.co/papers/2403.01234"),
            "2403.01234.pdf"
        );
    }

    #[test]
    fn test_href_fallback_is_filtered() {
        assert_eq!(
            safe_filename("", "https://huggingface.co/papers/2403.01234#community"),
            "2403.01234community.pdf"
        );
        assert_eq!(
            safe_filename("", "https://huggingface.co/papers/2403.01234?a=1&b=%20"),
            "2403.01234a1b20.pdf"
        );
    }

    #[test]
    fn test_trailing_slash_href_gives_bare_extension() {
        assert_eq!(safe_filename("", "https://huggingface.co/papers/"), ".pdf");
    }

    #[test]
    fn test_long_title_truncated() {
        let title = "a".repeat(250);
        let name = safe_filename(&title, "h");
        assert_eq!(name.len(), 204);
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let title = "é".repeat(300);
        let name = safe_filename(&title, "h");
        assert_eq!(name.trim_end_matches(".pdf").chars().count(), 200);
    }

    #[test]
    fn test_unicode_word_characters_survive() {
        assert_eq!(safe_filename("Über Modelle", "h"), "Über Modelle.pdf");
    }
}
