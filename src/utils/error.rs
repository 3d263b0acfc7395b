//! Error types for the acquisition pipeline
//!
//! This module defines custom error types used throughout the application.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while scraping a clip page with the headless browser
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Browser could not be configured or launched
    #[error("Browser launch failed: {0}")]
    Launch(String),

    /// Page navigation failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Page navigation exceeded the configured timeout
    #[error("Navigation timed out after {0:?}")]
    Timeout(Duration),

    /// In-page script evaluation failed
    #[error("Script evaluation failed: {0}")]
    Eval(String),

    /// Scraping-gateway request failed
    #[error("Gateway request failed: {0}")]
    Gateway(String),

    /// Gateway returned a non-success status
    #[error("Gateway returned status {0}")]
    GatewayStatus(u16),
}

impl ScrapeError {
    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Launch(_) => false,
            Self::Navigation(_) | Self::Timeout(_) | Self::Eval(_) | Self::Gateway(_) => true,
            Self::GatewayStatus(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
        }
    }
}

/// Errors that can occur during view-count acquisition
#[derive(Error, Debug)]
pub enum AcquireError {
    /// HTTP request error against the official metrics API
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Metrics API returned a non-success status
    #[error("Metrics API returned status {0}")]
    ApiStatus(u16),

    /// Metrics API response did not contain the expected fields
    #[error("Metrics API response malformed: {0}")]
    ApiResponse(String),

    /// No `/video/{id}` segment in the submitted URL
    #[error("No video id in URL: {0}")]
    MissingVideoId(String),

    /// Scrape strategy failed
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Every strategy in the chain failed after retries
    #[error("All acquisition strategies exhausted")]
    Exhausted,
}

impl AcquireError {
    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::ApiStatus(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::ApiResponse(_) | Self::MissingVideoId(_) => false,
            Self::Scrape(e) => e.is_recoverable(),
            // A fresh scheduler pass may succeed where this one did not
            Self::Exhausted => true,
        }
    }
}
