//! Efficient text processing utilities

use std::borrow::Cow;

/// Case-insensitive text operations without allocation when possible
pub struct TextUtils;

impl TextUtils {
    /// Check if text contains pattern (case-insensitive)
    pub fn contains_ignore_case(text: &str, pattern: &str) -> bool {
        if pattern.len() > text.len() {
            return false;
        }
        text.to_lowercase().contains(&pattern.to_lowercase())
    }

    /// Count words efficiently (no allocation)
    pub fn count_words(text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        text.split_whitespace().count()
    }

    /// Truncate text to max length with ellipsis if needed
    pub fn truncate_with_ellipsis(text: &str, max_len: usize) -> Cow<'_, str> {
        if text.len() <= max_len {
            Cow::Borrowed(text)
        } else if max_len <= 3 {
            Cow::Borrowed("...")
        } else {
            let mut result = String::with_capacity(max_len);
            let mut end = max_len - 3;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            result.push_str(&text[..end]);
            result.push_str("...");
            Cow::Owned(result)
        }
    }
}
