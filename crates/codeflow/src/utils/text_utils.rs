//! Text helpers shared by config parsing and the LLM client

use std::borrow::Cow;

/// Small string utilities without a natural home elsewhere.
pub struct TextUtils;

impl TextUtils {
    /// Cut `text` to at most `max_chars` characters, always on a char boundary.
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        }
    }

    /// Split a comma-separated list, trimming entries, dropping empties and
    /// repeated values while keeping first-seen order.
    pub fn split_list(raw: &str) -> Vec<String> {
        let mut items: Vec<String> = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
        items
    }

    /// Remove a surrounding markdown code fence (```json ... ```) if present.
    pub fn strip_code_fence(text: &str) -> Cow<'_, str> {
        let trimmed = text.trim();
        if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
            return Cow::Borrowed(trimmed);
        }
        let inner = &trimmed[3..trimmed.len() - 3];
        // Drop the language tag on the opening line.
        let inner = match inner.split_once('\n') {
            Some((tag, rest)) if !tag.trim().contains(' ') => rest,
            _ => inner,
        };
        Cow::Owned(inner.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(TextUtils::truncate_chars("héllo", 2), "hé");
        assert_eq!(TextUtils::truncate_chars("abc", 10), "abc");
        assert_eq!(TextUtils::truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            TextUtils::split_list(" pdf, txt,,PDF , txt "),
            vec!["pdf".to_string(), "txt".to_string(), "PDF".to_string()]
        );
        assert!(TextUtils::split_list(" , ").is_empty());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(
            TextUtils::strip_code_fence("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(TextUtils::strip_code_fence("  plain  "), "plain");
        assert_eq!(TextUtils::strip_code_fence("```\nx\n```"), "x");
    }
}
