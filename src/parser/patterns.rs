//! Regex fallback patterns for metric extraction
//!
//! When no DOM selector matches, the rendered HTML still carries the
//! counters: the hydration JSON blob, SEO meta tags, or visible text.
//! Each counter has an ordered pattern list tried first-match-wins over
//! the full document.

use lazy_static::lazy_static;
use regex::Regex;

macro_rules! parse_pattern {
    ($s:expr) => {
        Regex::new($s).expect(concat!("Invalid regex pattern: ", $s))
    };
}

lazy_static! {
    static ref VIEW_PATTERNS: Vec<Regex> = vec![
        // Hydration JSON: "playCount":1234567 or "playCount":"1.2M"
        parse_pattern!(r#""playCount"\s*:\s*"?([0-9][0-9,.]*[KMBkmb]?)"?"#),
        parse_pattern!(r#""viewCount"\s*:\s*"?([0-9][0-9,.]*)"?"#),
        // SEO meta tag
        parse_pattern!(r#"<meta[^>]*itemprop="interactionCount"[^>]*content="([0-9][0-9,.]*)""#),
        // Visible counter text
        parse_pattern!(r"(?i)([0-9][0-9,.]*[KMB]?)\s*views"),
    ];

    static ref LIKE_PATTERNS: Vec<Regex> = vec![
        parse_pattern!(r#""diggCount"\s*:\s*"?([0-9][0-9,.]*[KMBkmb]?)"?"#),
        parse_pattern!(r#""likeCount"\s*:\s*"?([0-9][0-9,.]*)"?"#),
    ];

    static ref COMMENT_PATTERNS: Vec<Regex> = vec![
        parse_pattern!(r#""commentCount"\s*:\s*"?([0-9][0-9,.]*[KMBkmb]?)"?"#),
    ];

    static ref SHARE_PATTERNS: Vec<Regex> = vec![
        parse_pattern!(r#""shareCount"\s*:\s*"?([0-9][0-9,.]*[KMBkmb]?)"?"#),
    ];
}

/// Ordered pattern lists for the four counters
pub struct MetricPatterns {
    pub views: &'static [Regex],
    pub likes: &'static [Regex],
    pub comments: &'static [Regex],
    pub shares: &'static [Regex],
}

impl MetricPatterns {
    pub fn new() -> Self {
        Self {
            views: &VIEW_PATTERNS,
            likes: &LIKE_PATTERNS,
            comments: &COMMENT_PATTERNS,
            shares: &SHARE_PATTERNS,
        }
    }
}

impl Default for MetricPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Return the first capture of the first matching pattern
pub fn first_capture(haystack: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(haystack)
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str().to_string())
    })
}
