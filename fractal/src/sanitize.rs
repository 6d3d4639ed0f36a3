//! Text sanitization applied to every thought before it is stored as node content.
//!
//! Prompts fence untrusted text inside triple-quote delimiters; a thought that
//! carries its own delimiter could close the fence and rewrite the prompt around
//! it. [`sanitize`] removes the delimiters and bounds the length.

/// Maximum number of characters (Unicode scalar values) kept in node content.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Delimiter sequences used to fence thoughts inside prompts.
pub const PROMPT_DELIMITERS: [&str; 2] = ["\"\"\"", "'''"];

/// Strips prompt delimiters and truncates to [`MAX_CONTENT_CHARS`].
///
/// Removal repeats until no delimiter remains: deleting `'''` from `""'''"`
/// leaves `"""`, which must go as well.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    while let Some(delim) = PROMPT_DELIMITERS.iter().find(|d| out.contains(**d)) {
        out = out.replace(*delim, "");
    }
    let cut = out.char_indices().nth(MAX_CONTENT_CHARS).map(|(i, _)| i);
    if let Some(byte_idx) = cut {
        out.truncate(byte_idx);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_both_delimiters() {
        assert_eq!(sanitize(r#"a"""b'''c"#), "abc");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(sanitize("Check competitor moves"), "Check competitor moves");
    }

    #[test]
    fn removal_that_joins_fragments_is_repeated() {
        let out = sanitize(r#"x""'''"y"#);
        assert!(!out.contains("\"\"\""));
        assert!(!out.contains("'''"));
        assert_eq!(out, "xy");
    }

    #[test]
    fn truncates_to_max_chars() {
        let long = "a".repeat(MAX_CONTENT_CHARS + 250);
        assert_eq!(sanitize(&long).chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_CONTENT_CHARS + 1);
        let out = sanitize(&long);
        assert_eq!(out.chars().count(), MAX_CONTENT_CHARS);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn delimiters_are_removed_before_truncation() {
        let mut text = "\"\"\"".repeat(10);
        text.push_str(&"b".repeat(MAX_CONTENT_CHARS));
        assert_eq!(sanitize(&text), "b".repeat(MAX_CONTENT_CHARS));
    }

    #[test]
    fn only_delimiters_becomes_empty() {
        assert_eq!(sanitize("'''\"\"\""), "");
    }
}
