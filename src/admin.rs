//! Manual admin override
//!
//! An admin can approve a submission and pay it immediately, or reject it
//! for good. Approval here bypasses the campaign view threshold but not
//! the minimum payout threshold; rejection is terminal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Submission, SubmissionStatus};
use crate::payout::{PayoutOutcome, PayoutTrigger};
use crate::storage::{CampaignRepository, SubmissionRepository};

/// Admin override errors
#[derive(Error, Debug)]
pub enum AdminError {
    /// Actor does not have the admin role
    #[error("User {0} is not an admin")]
    NotAuthorized(String),

    /// Authorization service unreachable
    #[error("Authorization service error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authorization service returned a non-success status
    #[error("Authorization service returned status {0}")]
    ServiceStatus(u16),
}

/// Authorization collaborator contract
///
/// Also the token source for the official-API acquisition strategy: a
/// clipper who connected their platform account has a token on file.
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Whether the user holds the admin role
    async fn is_admin(&self, user_id: &str) -> std::result::Result<bool, AdminError>;

    /// Platform access token for a clipper, if they connected an account
    async fn access_token_for(
        &self,
        clipper_id: &str,
    ) -> std::result::Result<Option<String>, AdminError>;
}

/// Result of a manual validation
#[derive(Debug, Clone)]
pub struct AdminDecision {
    pub submission_id: String,
    pub approved: bool,
    pub status: SubmissionStatus,
    pub payment_triggered: bool,
    pub amount: rust_decimal::Decimal,
}

/// Authorized manual approve/reject that re-enters the payout pipeline
pub struct AdminOverride {
    auth: Arc<dyn AuthorizationClient>,
    submissions: Arc<dyn SubmissionRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    payout: Arc<PayoutTrigger>,
}

impl AdminOverride {
    pub fn new(
        auth: Arc<dyn AuthorizationClient>,
        submissions: Arc<dyn SubmissionRepository>,
        campaigns: Arc<dyn CampaignRepository>,
        payout: Arc<PayoutTrigger>,
    ) -> Self {
        Self {
            auth,
            submissions,
            campaigns,
            payout,
        }
    }

    /// Verify the actor is an admin, or fail with an auth error
    pub async fn require_admin(&self, user_id: &str) -> Result<()> {
        let is_admin = self.auth.is_admin(user_id).await.map_err(Error::Admin)?;
        if !is_admin {
            return Err(AdminError::NotAuthorized(user_id.to_string()).into());
        }
        Ok(())
    }

    /// Manually validate a submission and, on approval, attempt a payout
    ///
    /// Rejection is terminal and stops there. Approval computes earnings
    /// from the views already on record and runs the payout trigger once,
    /// synchronously; whether money moved is surfaced in the decision.
    pub async fn validate_and_pay(
        &self,
        admin_id: &str,
        submission_id: &str,
        approved: bool,
        notes: Option<&str>,
    ) -> Result<AdminDecision> {
        self.require_admin(admin_id).await?;

        let submission = self
            .submissions
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| Error::not_found("submission", submission_id))?;

        if !approved {
            let rejected = self
                .submissions
                .reject(submission_id, admin_id, notes)
                .await?;

            info!(
                submission_id = %submission_id,
                admin_id = %admin_id,
                "Submission rejected by admin"
            );

            return Ok(AdminDecision {
                submission_id: submission_id.to_string(),
                approved: false,
                status: rejected.status,
                payment_triggered: false,
                amount: rust_decimal::Decimal::ZERO,
            });
        }

        // Promote pending work; an already-approved submission passes through
        let submission = self.promote_if_pending(submission, admin_id).await?;

        let campaign = self
            .campaigns
            .get_campaign(&submission.campaign_id)
            .await?
            .ok_or_else(|| Error::not_found("campaign", &submission.campaign_id))?;

        // Manual approval skips the view-threshold gate but not the
        // minimum-payout gate inside the trigger.
        let outcome: PayoutOutcome = self.payout.try_payout(&submission, &campaign).await?;

        if let Some(reason) = outcome.skipped {
            warn!(
                submission_id = %submission_id,
                reason = ?reason,
                "Admin-approved payout did not trigger"
            );
        }

        let status = self
            .submissions
            .get_submission(submission_id)
            .await?
            .map(|s| s.status)
            .unwrap_or(submission.status);

        Ok(AdminDecision {
            submission_id: submission_id.to_string(),
            approved: true,
            status,
            payment_triggered: outcome.triggered,
            amount: outcome.amount,
        })
    }

    async fn promote_if_pending(
        &self,
        submission: Submission,
        admin_id: &str,
    ) -> Result<Submission> {
        if submission.status != SubmissionStatus::Pending {
            return Ok(submission);
        }

        self.submissions.approve(&submission.id, admin_id).await?;

        self.submissions
            .get_submission(&submission.id)
            .await?
            .ok_or_else(|| Error::not_found("submission", &submission.id))
    }
}

// ============================================================================
// HTTP Authorization Client
// ============================================================================

#[derive(Debug, Deserialize)]
struct RoleResponse {
    is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// HTTP implementation of the authorization collaborator contract
pub struct HttpAuthorizationClient {
    client: Client,
    base_url: String,
}

impl HttpAuthorizationClient {
    pub fn new(base_url: &str, timeout: Duration) -> std::result::Result<Self, AdminError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AuthorizationClient for HttpAuthorizationClient {
    async fn is_admin(&self, user_id: &str) -> std::result::Result<bool, AdminError> {
        let url = format!("{}/users/{}/role", self.base_url, user_id);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(AdminError::ServiceStatus(status.as_u16()));
        }

        let body: RoleResponse = response.json().await?;
        Ok(body.is_admin)
    }

    async fn access_token_for(
        &self,
        clipper_id: &str,
    ) -> std::result::Result<Option<String>, AdminError> {
        let url = format!("{}/clippers/{}/platform-token", self.base_url, clipper_id);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AdminError::ServiceStatus(status.as_u16()));
        }

        let body: TokenResponse = response.json().await?;
        Ok(body.access_token.filter(|token| !token.is_empty()))
    }
}
