use regex::Regex;
use std::sync::LazyLock;

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());
static HORIZONTAL_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static PADDED_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?\n ?").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Canonical whitespace for extracted text.
///
/// Line breaks become `\n`, space/tab runs become one space, spaces next to a
/// newline are dropped, no more than one blank line survives and the result
/// is trimmed. Applying it twice changes nothing.
///
/// ```
/// use sift_web::normalize::normalize_text;
///
/// assert_eq!(normalize_text(Some("  a \t b\r\n\r\n\r\n c  ")), "a b\n\nc");
/// assert_eq!(normalize_text(None), "");
/// ```
pub fn normalize_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let text = LINE_BREAKS.replace_all(text, "\n");
    let text = HORIZONTAL_RUNS.replace_all(&text, " ");
    let text = PADDED_NEWLINE.replace_all(&text, "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_inputs_normalize_to_empty() {
        assert_eq!(normalize_text(None), "");
        assert_eq!(normalize_text(Some("")), "");
        assert_eq!(normalize_text(Some(" \t\r\n ")), "");
    }

    #[test]
    fn lone_carriage_returns_become_newlines() {
        assert_eq!(normalize_text(Some("a\rb\r\rc")), "a\nb\n\nc");
    }

    #[test]
    fn spaces_around_newlines_are_removed() {
        assert_eq!(normalize_text(Some("one  \n   two\t\n\tthree")), "one\ntwo\nthree");
    }

    #[test]
    fn blank_lines_are_capped_at_one() {
        assert_eq!(normalize_text(Some("a\n\n\n\n\nb")), "a\n\nb");
        assert_eq!(normalize_text(Some("a\n \n \n b")), "a\n\nb");
    }

    #[test]
    fn non_breaking_spaces_survive() {
        assert_eq!(normalize_text(Some("a\u{a0}\u{a0}b")), "a\u{a0}\u{a0}b");
    }

    proptest! {
        #[test]
        fn normalizing_is_idempotent(s in "[ \\t\\r\\na-z,.\u{a0}]{0,64}") {
            let once = normalize_text(Some(&s));
            prop_assert_eq!(normalize_text(Some(&once)), once.clone());
        }

        #[test]
        fn output_has_no_edge_whitespace_or_long_gaps(s in "[ \\t\\r\\nxy]{0,64}") {
            let out = normalize_text(Some(&s));
            prop_assert_eq!(out.trim(), out.as_str());
            prop_assert!(!out.contains("\n\n\n"));
            prop_assert!(!out.contains("  "));
            prop_assert!(!out.contains('\r'));
            prop_assert!(!out.contains('\t'));
        }
    }
}
