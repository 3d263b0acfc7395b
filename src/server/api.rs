//! Action endpoint handlers
//!
//! Requests arrive as a single action-dispatched POST whose body is a
//! closed tagged union: the `action` field selects the variant and each
//! variant carries its own typed payload. Unknown actions and missing
//! fields are rejected at deserialization time.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::earnings;
use crate::error::Error;
use crate::models::{Submission, SubmissionStatus};

use super::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Action-dispatched request body
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionRequest {
    /// Refresh every eligible submission
    ScrapeAll,

    /// Scrape one URL without touching any submission
    ScrapeSingle { url: String },

    /// Refresh one submission through the full pipeline
    UpdateSubmission {
        submission_id: String,
        user_id: String,
    },

    /// Admin approve/reject with immediate payout attempt
    ValidatePayment {
        admin_id: String,
        submission_id: String,
        approved: bool,
        #[serde(default)]
        admin_notes: Option<String>,
    },

    /// Admin list of pending submissions with payout context
    GetPendingSubmissions { admin_id: String },
}

impl ActionRequest {
    fn name(&self) -> &'static str {
        match self {
            Self::ScrapeAll => "scrape-all",
            Self::ScrapeSingle { .. } => "scrape-single",
            Self::UpdateSubmission { .. } => "update-submission",
            Self::ValidatePayment { .. } => "validate-payment",
            Self::GetPendingSubmissions { .. } => "get-pending-submissions",
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ScrapeSingleResponse {
    pub success: bool,
    pub views: u64,
}

#[derive(Debug, Serialize)]
pub struct UpdateSubmissionResponse {
    pub success: bool,
    pub views: u64,
    pub earnings: Decimal,
    pub meets_requirement: bool,
    pub status: SubmissionStatus,
}

#[derive(Debug, Serialize)]
pub struct ValidatePaymentResponse {
    pub success: bool,
    pub payment_triggered: bool,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pending submission enriched with payout context for the admin screen
#[derive(Debug, Serialize)]
pub struct EnrichedSubmission {
    #[serde(flatten)]
    pub submission: Submission,
    pub potential_earnings: Decimal,
    pub meets_requirement: bool,
    pub has_payout_destination: bool,
}

#[derive(Debug, Serialize)]
pub struct PendingSubmissionsResponse {
    pub success: bool,
    pub submissions: Vec<EnrichedSubmission>,
}

// ============================================================================
// Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/actions", post(dispatch_action))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    })
}

/// Prometheus exposition endpoint
async fn prometheus_metrics() -> impl IntoResponse {
    crate::metrics::render()
}

/// Dispatch an action request to its handler
async fn dispatch_action(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Response {
    crate::metrics::record_api_request(request.name());

    match request {
        ActionRequest::ScrapeAll => scrape_all(state).await,
        ActionRequest::ScrapeSingle { url } => scrape_single(state, url).await,
        ActionRequest::UpdateSubmission {
            submission_id,
            user_id,
        } => update_submission(state, submission_id, user_id).await,
        ActionRequest::ValidatePayment {
            admin_id,
            submission_id,
            approved,
            admin_notes,
        } => validate_payment(state, admin_id, submission_id, approved, admin_notes).await,
        ActionRequest::GetPendingSubmissions { admin_id } => {
            get_pending_submissions(state, admin_id).await
        }
    }
}

async fn scrape_all(state: AppState) -> Response {
    match state.scheduler.run_all().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn scrape_single(state: AppState, url: String) -> Response {
    if !crate::utils::is_valid_clip_url(&url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid clip URL: {url}"))),
        )
            .into_response();
    }

    // No submission context: the chain runs without an access token, so
    // this is always the scrape strategy. Exhaustion is an explicit
    // zero-view failure, never an invented count.
    match state.scheduler.scrape_url(&url).await {
        Ok(metrics) => (
            StatusCode::OK,
            Json(ScrapeSingleResponse {
                success: true,
                views: metrics.views,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(url = %url, error = %e, "Single-URL scrape failed");
            (
                StatusCode::OK,
                Json(ScrapeSingleResponse {
                    success: false,
                    views: 0,
                }),
            )
                .into_response()
        }
    }
}

async fn update_submission(state: AppState, submission_id: String, user_id: String) -> Response {
    // The caller must own the submission or be an admin
    let submission = match state.submissions.get_submission(&submission_id).await {
        Ok(Some(submission)) => submission,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!(
                    "submission not found: {submission_id}"
                ))),
            )
                .into_response();
        }
        Err(e) => return error_response(&e),
    };

    if submission.clipper_id != user_id {
        match state.auth.is_admin(&user_id).await {
            Ok(true) => {}
            Ok(false) => {
                return (
                    StatusCode::FORBIDDEN,
                    Json(ErrorResponse::new("not the submission owner")),
                )
                    .into_response();
            }
            Err(e) => return error_response(&Error::Admin(e)),
        }
    }

    match state.scheduler.process_submission(&submission_id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(UpdateSubmissionResponse {
                success: true,
                views: outcome.views,
                earnings: outcome.earnings_potential,
                meets_requirement: outcome.meets_requirement,
                status: outcome.status,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn validate_payment(
    state: AppState,
    admin_id: String,
    submission_id: String,
    approved: bool,
    admin_notes: Option<String>,
) -> Response {
    match state
        .admin
        .validate_and_pay(&admin_id, &submission_id, approved, admin_notes.as_deref())
        .await
    {
        Ok(decision) => (
            StatusCode::OK,
            Json(ValidatePaymentResponse {
                success: true,
                payment_triggered: decision.payment_triggered,
                amount: decision.amount,
                error: None,
            }),
        )
            .into_response(),
        // Payment failures preserve submission state; surface them in the
        // response body so the admin can retry.
        Err(Error::Payout(e)) => (
            StatusCode::OK,
            Json(ValidatePaymentResponse {
                success: false,
                payment_triggered: false,
                amount: Decimal::ZERO,
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn get_pending_submissions(state: AppState, admin_id: String) -> Response {
    if let Err(e) = state.admin.require_admin(&admin_id).await {
        return error_response(&e);
    }

    let pending = match state
        .submissions
        .list_by_status(SubmissionStatus::Pending)
        .await
    {
        Ok(pending) => pending,
        Err(e) => return error_response(&e),
    };

    let mut enriched = Vec::with_capacity(pending.len());
    for submission in pending {
        let campaign = match state.campaigns.get_campaign(&submission.campaign_id).await {
            Ok(campaign) => campaign,
            Err(e) => return error_response(&e),
        };

        let (potential_earnings, meets_requirement) = match &campaign {
            Some(campaign) => (
                earnings::potential_earnings(&submission, campaign),
                submission.meets_requirement(campaign),
            ),
            None => (Decimal::ZERO, false),
        };

        let has_payout_destination = match state
            .payment
            .has_payout_destination(&submission.clipper_id)
            .await
        {
            Ok(has) => has,
            Err(e) => {
                warn!(
                    clipper_id = %submission.clipper_id,
                    error = %e,
                    "Payout destination lookup failed; reporting as missing"
                );
                false
            }
        };

        enriched.push(EnrichedSubmission {
            submission,
            potential_earnings,
            meets_requirement,
            has_payout_destination,
        });
    }

    (
        StatusCode::OK,
        Json(PendingSubmissionsResponse {
            success: true,
            submissions: enriched,
        }),
    )
        .into_response()
}

/// Map a pipeline error to a status code and error body
fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::Admin(_) => StatusCode::FORBIDDEN,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Validation(_) | Error::Transition(_) => StatusCode::BAD_REQUEST,
        Error::Acquire(_) | Error::Scrape(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
        Error::Payout(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}
