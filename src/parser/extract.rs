//! Metric extraction from rendered clip pages
//!
//! Extraction tries the DOM selector chain against the parsed document
//! first, then falls back to the regex patterns over the raw HTML. A page
//! with no recognizable view counter yields `views: None`; the caller
//! decides whether that is worth zero views or a failed strategy.

use scraper::{Html, Selector};
use tracing::debug;

use super::patterns::{first_capture, MetricPatterns};
use super::selectors::MetricSelectors;
use super::views::parse_view_count;

/// Counters pulled out of one rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedCounts {
    /// `None` when no selector or pattern recognized a view counter
    pub views: Option<u64>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Extracts the four engagement counters from clip page HTML
pub struct MetricsExtractor {
    selectors: MetricSelectors,
    patterns: MetricPatterns,
}

impl MetricsExtractor {
    pub fn new() -> Self {
        Self {
            selectors: MetricSelectors::new(),
            patterns: MetricPatterns::new(),
        }
    }

    /// Extract counters from a rendered document
    pub fn extract(&self, html: &str) -> ExtractedCounts {
        let document = Html::parse_document(html);

        let views_text = self
            .extract_first_match(&document, self.selectors.views)
            .or_else(|| first_capture(html, self.patterns.views));

        if views_text.is_none() {
            debug!("No view counter recognized in page");
        }

        ExtractedCounts {
            views: views_text.map(|text| parse_view_count(&text)),
            likes: self.extract_count(&document, html, self.selectors.likes, self.patterns.likes),
            comments: self.extract_count(
                &document,
                html,
                self.selectors.comments,
                self.patterns.comments,
            ),
            shares: self.extract_count(
                &document,
                html,
                self.selectors.shares,
                self.patterns.shares,
            ),
        }
    }

    /// Selector chain then pattern chain; missing counters are zero
    fn extract_count(
        &self,
        document: &Html,
        html: &str,
        selectors: &[Selector],
        patterns: &[regex::Regex],
    ) -> u64 {
        self.extract_first_match(document, selectors)
            .or_else(|| first_capture(html, patterns))
            .map(|text| parse_view_count(&text))
            .unwrap_or(0)
    }

    /// Return the text of the first element matched by the selector chain
    fn extract_first_match(&self, document: &Html, selectors: &[Selector]) -> Option<String> {
        for selector in selectors {
            if let Some(element) = document.select(selector).next() {
                let text: String = element.text().collect::<Vec<_>>().join("");
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}

impl Default for MetricsExtractor {
    fn default() -> Self {
        Self::new()
    }
}
