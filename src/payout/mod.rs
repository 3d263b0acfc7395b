//! Idempotent payout triggering
//!
//! The trigger is the only code path allowed to move money. Its safety
//! property: a payment failure leaves the submission untouched so the
//! next pass can retry, and a successful payment is committed exactly
//! once per watermark via the repository's compare-and-swap.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::earnings;
use crate::error::Result;
use crate::models::{Campaign, Submission, SubmissionStatus, TransitionError};
use crate::storage::SubmissionRepository;

/// Payout trigger and payment collaborator errors
#[derive(Error, Debug)]
pub enum PayoutError {
    /// Payment service refused the payout
    #[error("Payment rejected: {0}")]
    Rejected(String),

    /// Payment service unreachable or misbehaving
    #[error("Payment service error: {0}")]
    Http(#[from] reqwest::Error),

    /// Payment service returned a non-success status
    #[error("Payment service returned status {0}")]
    ServiceStatus(u16),

    /// The watermark moved between payment and commit
    ///
    /// The transfer went out but a concurrent runner committed first;
    /// needs reconciliation, never an automatic retry.
    #[error("Payout commit conflict for submission {id}: watermark moved")]
    CommitConflict { id: String },
}

impl PayoutError {
    /// Check if this error is worth retrying on a later pass
    pub fn is_recoverable(&self) -> bool {
        match self {
            // State was preserved; the next scheduler pass retries safely
            Self::Rejected(_) | Self::Http(_) => true,
            Self::ServiceStatus(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::CommitConflict { .. } => false,
        }
    }
}

/// Confirmation returned by the payment collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct PayoutReceipt {
    pub transfer_id: String,
}

/// Payment collaborator contract
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Move money to a clipper for a submission
    async fn initiate_payout(
        &self,
        clipper_id: &str,
        amount: Decimal,
        submission_id: &str,
    ) -> std::result::Result<PayoutReceipt, PayoutError>;

    /// Whether the clipper registered somewhere to be paid
    async fn has_payout_destination(
        &self,
        clipper_id: &str,
    ) -> std::result::Result<bool, PayoutError>;
}

/// Why a payout pass ended without a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutSkip {
    /// Watermark already covers the current views; silent no-op
    WatermarkCovered,
    /// Delta earnings below the minimum payout threshold
    BelowThreshold,
    /// Clipper has no payout destination registered
    NoDestination,
}

/// Result of one `try_payout` pass
#[derive(Debug, Clone)]
pub struct PayoutOutcome {
    pub triggered: bool,
    /// Amount paid; zero when skipped
    pub amount: Decimal,
    pub transfer_id: Option<String>,
    pub skipped: Option<PayoutSkip>,
}

impl PayoutOutcome {
    fn skipped(reason: PayoutSkip) -> Self {
        Self {
            triggered: false,
            amount: Decimal::ZERO,
            transfer_id: None,
            skipped: Some(reason),
        }
    }
}

/// Gates and commits payouts
pub struct PayoutTrigger {
    payment: Arc<dyn PaymentClient>,
    repo: Arc<dyn SubmissionRepository>,
    minimum_threshold: Decimal,
}

impl PayoutTrigger {
    pub fn new(
        payment: Arc<dyn PaymentClient>,
        repo: Arc<dyn SubmissionRepository>,
        minimum_threshold: Decimal,
    ) -> Self {
        Self {
            payment,
            repo,
            minimum_threshold,
        }
    }

    /// Attempt a payout for the submission's unpaid view delta
    ///
    /// All gates must pass: unpaid delta above the watermark, delta
    /// earnings at or above the minimum threshold, and a registered
    /// payout destination. On payment success the watermark advance,
    /// earnings increment, `paid` status, and timestamp are committed in
    /// one compare-and-swap write; on payment failure nothing changes.
    pub async fn try_payout(
        &self,
        submission: &Submission,
        campaign: &Campaign,
    ) -> Result<PayoutOutcome> {
        if submission.status.is_terminal() {
            return Err(TransitionError::Terminal {
                id: submission.id.clone(),
                status: submission.status,
            }
            .into());
        }

        // Only approved work can be paid; a paid submission may pay again
        // on the delta above its watermark.
        if !matches!(
            submission.status,
            SubmissionStatus::Approved | SubmissionStatus::ReadyForPayment | SubmissionStatus::Paid
        ) {
            return Err(TransitionError::Invalid {
                from: submission.status,
                to: SubmissionStatus::Paid,
            }
            .into());
        }

        // Idempotency gate: the watermark already covers these views
        if submission.delta_views() == 0 {
            debug!(
                submission_id = %submission.id,
                paid_views = submission.paid_views,
                "Watermark covers current views; nothing to pay"
            );
            return Ok(PayoutOutcome::skipped(PayoutSkip::WatermarkCovered));
        }

        let amount = earnings::payable_amount(submission, campaign);
        if amount < self.minimum_threshold {
            debug!(
                submission_id = %submission.id,
                amount = %amount,
                threshold = %self.minimum_threshold,
                "Delta earnings below payout threshold"
            );
            return Ok(PayoutOutcome::skipped(PayoutSkip::BelowThreshold));
        }

        if !self
            .payment
            .has_payout_destination(&submission.clipper_id)
            .await
            .map_err(crate::error::Error::Payout)?
        {
            debug!(
                clipper_id = %submission.clipper_id,
                "Clipper has no payout destination registered"
            );
            return Ok(PayoutOutcome::skipped(PayoutSkip::NoDestination));
        }

        // Money moves here. A failure propagates with no local mutation.
        let receipt = self
            .payment
            .initiate_payout(&submission.clipper_id, amount, &submission.id)
            .await
            .map_err(crate::error::Error::Payout)?;

        let new_accrued = submission.earnings_accrued + amount;
        let committed = self
            .repo
            .commit_payout(
                &submission.id,
                submission.paid_views,
                submission.views,
                new_accrued,
                Utc::now(),
            )
            .await?;

        if !committed {
            // The transfer went out but another runner advanced the
            // watermark first; surface for reconciliation.
            error!(
                submission_id = %submission.id,
                transfer_id = %receipt.transfer_id,
                "Payout commit lost the watermark compare-and-swap"
            );
            return Err(PayoutError::CommitConflict {
                id: submission.id.clone(),
            }
            .into());
        }

        info!(
            submission_id = %submission.id,
            clipper_id = %submission.clipper_id,
            amount = %amount,
            transfer_id = %receipt.transfer_id,
            "Payout triggered"
        );
        crate::metrics::record_payout(&amount);

        Ok(PayoutOutcome {
            triggered: true,
            amount,
            transfer_id: Some(receipt.transfer_id),
            skipped: None,
        })
    }
}

// ============================================================================
// HTTP Payment Client
// ============================================================================

#[derive(Debug, Deserialize)]
struct PayoutResponse {
    success: bool,
    #[serde(default)]
    transfer_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestinationResponse {
    has_destination: bool,
}

/// HTTP implementation of the payment collaborator contract
pub struct HttpPaymentClient {
    client: Client,
    base_url: String,
}

impl HttpPaymentClient {
    pub fn new(base_url: &str, timeout: Duration) -> std::result::Result<Self, PayoutError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn initiate_payout(
        &self,
        clipper_id: &str,
        amount: Decimal,
        submission_id: &str,
    ) -> std::result::Result<PayoutReceipt, PayoutError> {
        let url = format!("{}/payouts", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "clipper_id": clipper_id,
                "amount": amount,
                "submission_id": submission_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PayoutError::ServiceStatus(status.as_u16()));
        }

        let body: PayoutResponse = response.json().await?;
        if !body.success {
            return Err(PayoutError::Rejected(
                body.error.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }

        body.transfer_id
            .map(|transfer_id| PayoutReceipt { transfer_id })
            .ok_or_else(|| PayoutError::Rejected("missing transfer id".to_string()))
    }

    async fn has_payout_destination(
        &self,
        clipper_id: &str,
    ) -> std::result::Result<bool, PayoutError> {
        let url = format!("{}/clippers/{}/payout-destination", self.base_url, clipper_id);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(PayoutError::ServiceStatus(status.as_u16()));
        }

        let body: DestinationResponse = response.json().await?;
        Ok(body.has_destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(PayoutError::Rejected("insufficient funds".into()).is_recoverable());
        assert!(PayoutError::ServiceStatus(503).is_recoverable());
        assert!(!PayoutError::ServiceStatus(400).is_recoverable());
        assert!(!PayoutError::CommitConflict { id: "s".into() }.is_recoverable());
    }

    #[test]
    fn test_payout_response_deserialization() {
        let json = r#"{"success": true, "transfer_id": "tr_123"}"#;
        let response: PayoutResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.transfer_id.as_deref(), Some("tr_123"));

        let json = r#"{"success": false, "error": "no balance"}"#;
        let response: PayoutResponse = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("no balance"));
    }

    #[test]
    fn test_skipped_outcome_is_zeroed() {
        let outcome = PayoutOutcome::skipped(PayoutSkip::BelowThreshold);
        assert!(!outcome.triggered);
        assert_eq!(outcome.amount, Decimal::ZERO);
        assert!(outcome.transfer_id.is_none());
        assert_eq!(outcome.skipped, Some(PayoutSkip::BelowThreshold));
    }
}
