//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use url::Url;

/// Extract the platform video ID from a clip URL
///
/// The video ID is the path segment immediately following `/video/`,
/// e.g. `https://www.tiktok.com/@user/video/7311234567890123456`.
/// Returns `None` when the URL has no such segment.
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;

    while let Some(segment) = segments.next() {
        if segment == "video" {
            return segments
                .next()
                .filter(|id| !id.is_empty())
                .map(|id| id.to_string());
        }
    }

    None
}

/// Validate that a string is a well-formed http(s) URL
pub fn is_valid_clip_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}
