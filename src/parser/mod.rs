//! View-count parsing and metric extraction
//!
//! This module turns what a clip page shows into numbers the pipeline can
//! pay against: human-readable counter strings, DOM selector chains, and
//! regex fallbacks over rendered HTML.

pub mod extract;
pub mod patterns;
pub mod selectors;
pub mod views;

pub use extract::{ExtractedCounts, MetricsExtractor};
pub use patterns::MetricPatterns;
pub use selectors::MetricSelectors;
pub use views::parse_view_count;
