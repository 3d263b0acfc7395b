//! View-count acquisition strategy chain
//!
//! Order of preference: the official metrics API (exact counters, needs
//! the clipper's access token), then a rendered-page scrape. Each
//! strategy retries with a fixed delay before the chain moves on; an
//! exhausted chain is an explicit failure, never an invented count.

pub mod api;
pub mod browser;
pub mod scrape;

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use tracing::{debug, warn};

use crate::admin::AuthorizationClient;
use crate::config::AcquirerConfig;
use crate::models::{MetricsSource, VideoMetrics};
use crate::utils::error::AcquireError;
use crate::utils::extract_video_id;
use crate::utils::retry::{with_retry_if, RetryConfig};

pub use api::{ApiVideoMetrics, HttpMetricsApi, MetricsApi};
pub use browser::{BrowserLease, BrowserManager, BrowserSettings};
pub use scrape::{GatewayClient, PageScraper};

/// Acquisition seam used by the scheduler and handlers
///
/// Mocked in tests; implemented by [`ViewCountAcquirer`] in production.
#[async_trait]
pub trait MetricsAcquirer: Send + Sync {
    /// Acquire current counters for a clip URL
    ///
    /// The clipper id, when known, unlocks the official-API strategy via
    /// their stored access token; without it the chain starts at the
    /// scrape strategy.
    async fn acquire(
        &self,
        clipper_id: Option<&str>,
        video_url: &str,
    ) -> Result<VideoMetrics, AcquireError>;
}

/// Strategy-chain acquirer: official API, then scrape
pub struct ViewCountAcquirer {
    metrics_api: Arc<dyn MetricsApi>,
    auth: Arc<dyn AuthorizationClient>,
    scraper: PageScraper,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    retry: RetryConfig,
}

impl ViewCountAcquirer {
    /// Create an acquirer from its collaborators and config
    pub fn new(
        metrics_api: Arc<dyn MetricsApi>,
        auth: Arc<dyn AuthorizationClient>,
        scraper: PageScraper,
        config: &AcquirerConfig,
    ) -> Self {
        let rate = NonZeroU32::new(config.rate_limit).unwrap_or(NonZeroU32::new(1).unwrap());
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Self {
            metrics_api,
            auth,
            scraper,
            rate_limiter,
            retry: RetryConfig::fixed(config.max_retries, config.retry_delay_secs * 1000),
        }
    }

    /// Official API strategy: needs a token and a parseable video id
    async fn try_official_api(
        &self,
        video_url: &str,
        access_token: &str,
    ) -> Result<VideoMetrics, AcquireError> {
        // No video id means this strategy cannot apply; fail it without retries
        let video_id = extract_video_id(video_url)
            .ok_or_else(|| AcquireError::MissingVideoId(video_url.to_string()))?;

        let counts = with_retry_if(
            &self.retry,
            || async {
                self.rate_limiter.until_ready().await;
                self.metrics_api
                    .query_video_metrics(&video_id, access_token)
                    .await
            },
            AcquireError::is_recoverable,
        )
        .await?;

        Ok(VideoMetrics {
            views: counts.view_count,
            likes: counts.like_count,
            comments: counts.comment_count,
            shares: counts.share_count,
            source: MetricsSource::OfficialApi,
        })
    }

    /// Scrape strategy: rendered page, selector chain, regex fallback
    async fn try_scrape(&self, video_url: &str) -> Result<VideoMetrics, AcquireError> {
        let counts = with_retry_if(
            &self.retry,
            || async {
                self.rate_limiter.until_ready().await;
                self.scraper
                    .scrape(video_url)
                    .await
                    .map_err(AcquireError::from)
            },
            AcquireError::is_recoverable,
        )
        .await?;

        if counts.views.is_none() {
            warn!(url = %video_url, "No view counter recognized on page; counting zero views");
        }

        Ok(VideoMetrics {
            views: counts.views.unwrap_or(0),
            likes: counts.likes,
            comments: counts.comments,
            shares: counts.shares,
            source: MetricsSource::Scrape,
        })
    }
}

#[async_trait]
impl MetricsAcquirer for ViewCountAcquirer {
    async fn acquire(
        &self,
        clipper_id: Option<&str>,
        video_url: &str,
    ) -> Result<VideoMetrics, AcquireError> {
        // Strategy 1: official API when the clipper connected their account
        if let Some(clipper_id) = clipper_id {
            match self.auth.access_token_for(clipper_id).await {
                Ok(Some(token)) => match self.try_official_api(video_url, &token).await {
                    Ok(metrics) => {
                        crate::metrics::record_acquisition("official_api", "success");
                        return Ok(metrics);
                    }
                    Err(e) => {
                        crate::metrics::record_acquisition("official_api", "failure");
                        warn!(url = %video_url, error = %e, "Official API strategy failed, falling back to scrape");
                    }
                },
                Ok(None) => {
                    debug!(clipper_id = %clipper_id, "No access token; skipping official API strategy");
                }
                Err(e) => {
                    warn!(clipper_id = %clipper_id, error = %e, "Token lookup failed; skipping official API strategy");
                }
            }
        }

        // Strategy 2: scrape the public page
        match self.try_scrape(video_url).await {
            Ok(metrics) => {
                crate::metrics::record_acquisition("scrape", "success");
                Ok(metrics)
            }
            Err(e) => {
                crate::metrics::record_acquisition("scrape", "failure");
                warn!(url = %video_url, error = %e, "Scrape strategy failed");
                Err(AcquireError::Exhausted)
            }
        }
    }
}
