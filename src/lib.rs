//! clipfund - Clip campaign verification & payout pipeline
//!
//! Streamers fund campaigns; clippers submit short-video URLs and earn a
//! CPM-based reward once a clip crosses the campaign's view threshold.
//! This crate implements the verification and payout core: acquiring an
//! untrustworthy view count from the platform (official API or scraping),
//! converting it into money, and driving each submission through a state
//! machine that pays out **at most once** per watermark.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`acquirer`] - View-count acquisition strategy chain (API, browser scrape)
//! - [`parser`] - View-count text parsing and HTML metric extraction
//! - [`earnings`] - Fixed-point CPM earnings math
//! - [`models`] - Submissions, campaigns, and the status state machine
//! - [`payout`] - Idempotent payout trigger and payment collaborator contract
//! - [`scheduler`] - Sequential batch refresh over eligible submissions
//! - [`admin`] - Manual approve/reject override
//! - [`storage`] - SQLite-backed submission and campaign repositories
//! - [`server`] - Action-dispatched HTTP endpoints
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use clipfund::config::Config;
//! use clipfund::parser::parse_view_count;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     assert_eq!(parse_view_count("1.2M"), 1_200_000);
//!     Ok(())
//! }
//! ```

pub mod acquirer;
pub mod admin;
pub mod commands;
pub mod config;
pub mod earnings;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod payout;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{ClipfundErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Campaign, MetricsSource, Submission, SubmissionStatus, VideoMetrics};
    pub use crate::payout::{PaymentClient, PayoutOutcome, PayoutTrigger};
    pub use crate::scheduler::{BatchScheduler, BatchStats};
    pub use crate::storage::{CampaignRepository, SqliteStore, SubmissionRepository};
}

// Direct re-exports for convenience
pub use models::{Campaign, MetricsSource, Submission, SubmissionStatus, VideoMetrics};
