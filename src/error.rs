//! Unified error handling for the clipfund crate
//!
//! This module provides a unified error type that consolidates all
//! domain-specific errors into a single `Error` enum, while maintaining the
//! ability to use domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`ClipfundErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use clipfund::error::{ClipfundErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!("retrying: {err}");
//!     } else {
//!         tracing::error!("fatal: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::admin::AdminError;
pub use crate::models::TransitionError;
pub use crate::payout::PayoutError;
pub use crate::utils::error::{AcquireError, ScrapeError};

/// Common trait for all clipfund error types
///
/// This trait provides a unified interface for error handling across
/// all modules, enabling consistent error processing strategies.
pub trait ClipfundErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Parsing and metric extraction errors
    Parsing,
    /// Authorization errors (missing token, non-admin actor)
    Auth,
    /// Request validation errors
    Validation,
    /// Payment collaborator errors
    Payment,
    /// Storage and I/O errors
    Storage,
    /// Configuration errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short description used in log fields and batch summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::Payment => "payment",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for the clipfund crate
///
/// This enum wraps all domain-specific errors, providing a single error type
/// that can be used across module boundaries while preserving the detailed
/// error information.
#[derive(Error, Debug)]
pub enum Error {
    /// View-count acquisition errors
    #[error("Acquire error: {0}")]
    Acquire(#[from] AcquireError),

    /// Browser/gateway scraping errors
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// Submission state machine violations
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Payout trigger and payment collaborator errors
    #[error("Payout error: {0}")]
    Payout(#[from] PayoutError),

    /// Admin override errors
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Record lookup failures
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ClipfundErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Acquire(e) => e.is_recoverable(),
            Self::Scrape(e) => e.is_recoverable(),
            Self::Transition(_) => false,
            Self::Payout(e) => e.is_recoverable(),
            Self::Admin(_) => false,
            Self::NotFound { .. } => false,
            Self::Validation(_) => false,
            Self::Database(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Http(_) => true, // HTTP errors are often transient
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Acquire(AcquireError::Exhausted) => ErrorCategory::Network,
            Self::Acquire(AcquireError::MissingVideoId(_)) => ErrorCategory::Parsing,
            Self::Acquire(AcquireError::ApiResponse(_)) => ErrorCategory::Parsing,
            Self::Acquire(_) | Self::Scrape(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Transition(_) => ErrorCategory::Validation,
            Self::Payout(_) => ErrorCategory::Payment,
            Self::Admin(_) => ErrorCategory::Auth,
            Self::NotFound { .. } | Self::Validation(_) => ErrorCategory::Validation,
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error for a record kind
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
