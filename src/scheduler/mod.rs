//! Sequential batch refresh
//!
//! The scheduler walks every refreshable submission through the full
//! pipeline: acquire counters, persist the refresh, advance the state
//! machine, attempt a payout. It is intentionally sequential with a fixed
//! inter-item delay; parallel scraping of the same platform raises
//! detection and rate-limit risk. One submission failing never aborts the
//! rest of the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::acquirer::MetricsAcquirer;
use crate::earnings;
use crate::error::{ClipfundErrorTrait, Error, Result};
use crate::models::{SubmissionStatus, TransitionError};
use crate::payout::{PayoutOutcome, PayoutTrigger};
use crate::storage::{CampaignRepository, SubmissionRepository};

/// Aggregate counts for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of refreshing a single submission
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub submission_id: String,
    pub views: u64,
    /// Gross earnings for the current view count, ignoring the watermark
    pub earnings_potential: Decimal,
    pub meets_requirement: bool,
    pub status: SubmissionStatus,
    pub payout: Option<PayoutOutcome>,
}

/// Drives submissions through acquire → persist → transition → payout
pub struct BatchScheduler {
    submissions: Arc<dyn SubmissionRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    acquirer: Arc<dyn MetricsAcquirer>,
    payout: Arc<PayoutTrigger>,
    item_delay: Duration,
}

impl BatchScheduler {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        campaigns: Arc<dyn CampaignRepository>,
        acquirer: Arc<dyn MetricsAcquirer>,
        payout: Arc<PayoutTrigger>,
        item_delay: Duration,
    ) -> Self {
        Self {
            submissions,
            campaigns,
            acquirer,
            payout,
            item_delay,
        }
    }

    /// Refresh every eligible submission sequentially
    ///
    /// Per-item failures are logged and counted; the loop always reaches
    /// the end of the batch and reports aggregate counts.
    pub async fn run_all(&self) -> Result<BatchStats> {
        let start = Instant::now();
        let submissions = self.submissions.list_refreshable().await?;

        info!(count = submissions.len(), "Starting batch refresh");

        let mut stats = BatchStats::default();

        for (index, submission) in submissions.iter().enumerate() {
            // Inter-item delay keeps the scraped platform happy
            if index > 0 {
                tokio::time::sleep(self.item_delay).await;
            }

            stats.processed += 1;

            match self.process_submission(&submission.id).await {
                Ok(outcome) => {
                    stats.succeeded += 1;
                    crate::metrics::record_batch_item("success");
                    debug!(
                        submission_id = %outcome.submission_id,
                        views = outcome.views,
                        status = %outcome.status,
                        "Submission refreshed"
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    crate::metrics::record_batch_item("failure");
                    warn!(
                        submission_id = %submission.id,
                        error = %e,
                        category = %e.category(),
                        "Submission refresh failed; continuing batch"
                    );
                }
            }
        }

        crate::metrics::record_batch_run(start.elapsed().as_secs_f64());

        info!(
            processed = stats.processed,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Batch refresh complete"
        );

        Ok(stats)
    }

    /// Scrape a URL outside any submission context
    ///
    /// Used by the single-URL action; no token is available, so the
    /// chain goes straight to the scrape strategy.
    pub async fn scrape_url(&self, url: &str) -> Result<crate::models::VideoMetrics> {
        Ok(self.acquirer.acquire(None, url).await?)
    }

    /// Run one submission through the full pipeline
    pub async fn process_submission(&self, id: &str) -> Result<RefreshOutcome> {
        let submission = self
            .submissions
            .get_submission(id)
            .await?
            .ok_or_else(|| Error::not_found("submission", id))?;

        if submission.status.is_terminal() {
            return Err(TransitionError::Terminal {
                id: id.to_string(),
                status: submission.status,
            }
            .into());
        }

        if !submission.status.is_refreshable() {
            return Err(Error::validation(format!(
                "submission {id} is {} and not refreshable",
                submission.status
            )));
        }

        let campaign = self
            .campaigns
            .get_campaign(&submission.campaign_id)
            .await?
            .ok_or_else(|| Error::not_found("campaign", &submission.campaign_id))?;

        let counters = self
            .acquirer
            .acquire(Some(&submission.clipper_id), &submission.video_url)
            .await?;

        let mut submission = self.submissions.update_metrics(id, &counters).await?;

        // Crossing the campaign threshold promotes approved work
        if submission.status == SubmissionStatus::Approved && submission.meets_requirement(&campaign)
        {
            let promoted = self
                .submissions
                .set_status(
                    id,
                    SubmissionStatus::Approved,
                    SubmissionStatus::ReadyForPayment,
                )
                .await?;

            if promoted {
                submission.status = SubmissionStatus::ReadyForPayment;
            }
        }

        let payout = if submission.status == SubmissionStatus::ReadyForPayment {
            Some(self.payout.try_payout(&submission, &campaign).await?)
        } else {
            None
        };

        let status = match &payout {
            Some(outcome) if outcome.triggered => SubmissionStatus::Paid,
            _ => submission.status,
        };

        Ok(RefreshOutcome {
            submission_id: id.to_string(),
            views: submission.views,
            earnings_potential: earnings::potential_earnings(&submission, &campaign),
            meets_requirement: submission.meets_requirement(&campaign),
            status,
            payout,
        })
    }
}
