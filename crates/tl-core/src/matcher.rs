//! URL extraction from free text.
//!
//! One fixed, heuristic pattern: `http`/`https`, optional `www.`, a host run,
//! a 1-6 character top-level label, then an optional path/query/fragment
//! tail. Trailing punctuation in the tail character class is absorbed into
//! the match; callers depend on these exact boundaries.

use std::sync::LazyLock;

use regex::Regex;

/// Source pattern. `\b` is ASCII-only to keep boundaries stable on
/// non-Latin text.
pub const URL_PATTERN: &str = r"https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}(?-u:\b)([-a-zA-Z0-9()@:%_\+.~#?&//=]*)";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(URL_PATTERN).expect("URL pattern is valid"));

/// A located URL-like substring. Offsets are byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Find every URL in `text`, left to right, non-overlapping.
///
/// Scanning resumes strictly after the previous match's end.
pub fn find(text: &str) -> Vec<MatchSpan> {
    URL_RE
        .find_iter(text)
        .map(|m| MatchSpan {
            text: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Cheap pre-check: does `text` contain at least one URL?
#[inline]
pub fn contains_url(text: &str) -> bool {
    URL_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_single_url_with_offsets() {
        let text = "see https://example.com/a for details";
        let spans = find(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "https://example.com/a");
        assert_eq!(&text[spans[0].start..spans[0].end], "https://example.com/a");
        assert_eq!(spans[0].start, 4);
    }

    #[test]
    fn test_find_multiple_in_order() {
        let text = "a http://one.org b https://www.two.net/x?y=1#z c";
        let spans = find(text);
        let urls: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(urls, vec!["http://one.org", "https://www.two.net/x?y=1#z"]);
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(find("no links here, just ftp://files.example.com").is_empty());
        assert!(find("").is_empty());
        assert!(!contains_url("http://localhost"));
    }

    #[test]
    fn test_trailing_punctuation_is_absorbed() {
        // The heuristic keeps the trailing dot; boundaries are preserved as-is.
        let spans = find("Visit https://example.com/docs.");
        assert_eq!(spans[0].text, "https://example.com/docs.");
    }

    #[test]
    fn test_adjacent_urls_do_not_overlap() {
        let text = "https://a.io/x https://b.io/y https://c.io";
        let spans = find(text);
        assert_eq!(spans.len(), 3);
        for pair in spans.windows(2) {
            assert!(pair[1].start >= pair[0].end);
        }
    }

    #[test]
    fn test_non_ascii_neighbours() {
        let text = "链接：https://example.cn/路径";
        let spans = find(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "https://example.cn/");
        assert!(text.is_char_boundary(spans[0].start));
        assert!(text.is_char_boundary(spans[0].end));
    }

    #[test]
    fn test_contains_url_agrees_with_find() {
        for text in ["curl https://api.example.com/v1", "plain", "http://x.y"] {
            assert_eq!(contains_url(text), !find(text).is_empty());
        }
    }
}
