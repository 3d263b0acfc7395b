//! CSS selectors for clip page metric counters
//!
//! The platform ships several page shells (desktop watch page, browse
//! feed, embed player) with different markup for the same counters, and
//! rotates generated class names between deploys. Each counter therefore
//! carries an ordered selector list tried first-match-wins; the stable
//! `data-e2e` hooks come first, legacy class names last.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref VIEW_COUNT: Vec<Selector> = vec![
        parse_selector!("strong[data-e2e='video-views']"),
        parse_selector!("[data-e2e='browse-video-views']"),
        parse_selector!("[data-e2e='video-views']"),
        parse_selector!("strong.video-count"),
        parse_selector!("span.view-count"),
    ];

    static ref LIKE_COUNT: Vec<Selector> = vec![
        parse_selector!("strong[data-e2e='like-count']"),
        parse_selector!("[data-e2e='browse-like-count']"),
        parse_selector!("[data-e2e='like-count']"),
    ];

    static ref COMMENT_COUNT: Vec<Selector> = vec![
        parse_selector!("strong[data-e2e='comment-count']"),
        parse_selector!("[data-e2e='browse-comment-count']"),
        parse_selector!("[data-e2e='comment-count']"),
    ];

    static ref SHARE_COUNT: Vec<Selector> = vec![
        parse_selector!("strong[data-e2e='share-count']"),
        parse_selector!("[data-e2e='share-count']"),
    ];
}

/// Ordered selector lists for the four counters on a clip page
pub struct MetricSelectors {
    pub views: &'static [Selector],
    pub likes: &'static [Selector],
    pub comments: &'static [Selector],
    pub shares: &'static [Selector],
}

impl MetricSelectors {
    pub fn new() -> Self {
        Self {
            views: &VIEW_COUNT,
            likes: &LIKE_COUNT,
            comments: &COMMENT_COUNT,
            shares: &SHARE_COUNT,
        }
    }
}

impl Default for MetricSelectors {
    fn default() -> Self {
        Self::new()
    }
}
