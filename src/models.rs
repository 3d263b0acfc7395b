// Core data structures for the clip payout pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a metrics refresh came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    Scrape,
    OfficialApi,
}

impl MetricsSource {
    /// Get string representation (matches the persisted column value)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::OfficialApi => "official_api",
        }
    }

    /// Create from the persisted column value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scrape" => Some(Self::Scrape),
            "official_api" => Some(Self::OfficialApi),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetricsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One acquisition result for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub source: MetricsSource,
}

/// Submission lifecycle status
///
/// ```text
/// pending ──▶ approved ──▶ ready_for_payment ──▶ paid
///    │            │                │
///    └────────────┴──▶ rejected (terminal)
/// ```
///
/// `approved → paid` is also legal: the admin override pays without the
/// view-threshold gate. `paid` and `rejected` have no outgoing edges;
/// incremental payouts on a paid submission re-enter `paid` in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    ReadyForPayment,
    Paid,
}

/// State machine violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// Transition not in the allowed edge set
    #[error("Invalid transition: {from} -> {to}")]
    Invalid {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    /// Submission is in a terminal state and cannot be written
    #[error("Submission {id} is {status} and cannot change")]
    Terminal {
        id: String,
        status: SubmissionStatus,
    },
}

impl SubmissionStatus {
    /// Get string representation (matches the persisted column value)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ReadyForPayment => "ready_for_payment",
            Self::Paid => "paid",
        }
    }

    /// Create from the persisted column value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "ready_for_payment" => Some(Self::ReadyForPayment),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Terminal for all writes: metrics, earnings, and status are frozen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Statuses the batch scheduler refreshes
    pub fn is_refreshable(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::ReadyForPayment)
    }

    /// Check whether a transition is allowed by the state machine
    pub fn can_transition_to(&self, to: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Rejected)
                | (Approved, ReadyForPayment)
                | (Approved, Paid)
                | (ReadyForPayment, Paid)
        )
    }

    /// Validate a transition, returning a typed error on violation
    pub fn transition(&self, to: SubmissionStatus) -> Result<SubmissionStatus, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError::Invalid { from: *self, to })
        }
    }

    /// Get all statuses
    pub fn all() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Approved,
            Self::Rejected,
            Self::ReadyForPayment,
            Self::Paid,
        ]
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A clipper's video entry against a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub campaign_id: String,
    pub clipper_id: String,
    pub video_url: String,
    /// Monotonic non-decreasing across refreshes
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    /// Watermark: views already covered by a prior payout (≤ views)
    pub paid_views: u64,
    /// Total money paid out so far; only ever increases
    pub earnings_accrued: Decimal,
    pub status: SubmissionStatus,
    pub metrics_source: Option<MetricsSource>,
    pub admin_validated_by: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Create a fresh submission for a clip URL
    pub fn new(campaign_id: &str, clipper_id: &str, video_url: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            campaign_id: campaign_id.to_string(),
            clipper_id: clipper_id.to_string(),
            video_url: video_url.to_string(),
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            paid_views: 0,
            earnings_accrued: Decimal::ZERO,
            status: SubmissionStatus::Pending,
            metrics_source: None,
            admin_validated_by: None,
            admin_notes: None,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    /// Views accrued above the payout watermark
    pub fn delta_views(&self) -> u64 {
        self.views.saturating_sub(self.paid_views)
    }

    /// Whether the clip crossed the campaign's view threshold
    pub fn meets_requirement(&self, campaign: &Campaign) -> bool {
        self.views >= campaign.required_views
    }
}

/// Campaign terms, read-only to this pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    /// Money per 1000 views
    pub cpm_rate: Decimal,
    /// View threshold for the automatic payout path
    pub required_views: u64,
    pub budget: Decimal,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubmissionStatus::*;

    fn campaign(cpm: &str, required: u64) -> Campaign {
        Campaign {
            id: "camp-1".to_string(),
            cpm_rate: cpm.parse().unwrap(),
            required_views: required,
            budget: "1000".parse().unwrap(),
            total_spent: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in SubmissionStatus::all() {
            assert_eq!(SubmissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::parse("unknown"), None);
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(ReadyForPayment));
        assert!(Approved.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Paid));
        assert!(ReadyForPayment.can_transition_to(Paid));
    }

    #[test]
    fn test_forbidden_transitions() {
        // rejected and paid have no outgoing edges
        for to in SubmissionStatus::all() {
            assert!(!Rejected.can_transition_to(to));
            assert!(!Paid.can_transition_to(to));
        }
        assert!(!Pending.can_transition_to(ReadyForPayment));
        assert!(!Pending.can_transition_to(Paid));
        assert!(!ReadyForPayment.can_transition_to(Rejected));
    }

    #[test]
    fn test_transition_error() {
        let err = Paid.transition(Pending).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                from: Paid,
                to: Pending
            }
        );
        assert_eq!(Pending.transition(Approved).unwrap(), Approved);
    }

    #[test]
    fn test_delta_views() {
        let mut submission = Submission::new("camp-1", "clipper-1", "https://t/video/1");
        submission.views = 40_000;
        submission.paid_views = 15_000;
        assert_eq!(submission.delta_views(), 25_000);

        // Watermark never exceeds views, but saturate anyway
        submission.paid_views = 50_000;
        assert_eq!(submission.delta_views(), 0);
    }

    #[test]
    fn test_meets_requirement() {
        let campaign = campaign("0.03", 10_000);
        let mut submission = Submission::new(&campaign.id, "clipper-1", "https://t/video/1");
        assert!(!submission.meets_requirement(&campaign));
        submission.views = 10_000;
        assert!(submission.meets_requirement(&campaign));
    }

    #[test]
    fn test_metrics_source_roundtrip() {
        assert_eq!(MetricsSource::parse("scrape"), Some(MetricsSource::Scrape));
        assert_eq!(
            MetricsSource::parse("official_api"),
            Some(MetricsSource::OfficialApi)
        );
        assert_eq!(MetricsSource::parse("guess"), None);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&ReadyForPayment).unwrap();
        assert_eq!(json, "\"ready_for_payment\"");
        let parsed: SubmissionStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(parsed, Paid);
    }
}
