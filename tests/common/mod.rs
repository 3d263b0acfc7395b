//! Common test utilities

// Each integration test binary compiles this module and uses a subset
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use clipfund::acquirer::MetricsAcquirer;
use clipfund::admin::{AdminError, AuthorizationClient};
use clipfund::models::{Campaign, MetricsSource, Submission, SubmissionStatus, VideoMetrics};
use clipfund::payout::{PaymentClient, PayoutError, PayoutReceipt};
use clipfund::utils::error::AcquireError;

/// Create a test campaign: 0.03 CPM, 10k view threshold
pub fn create_test_campaign() -> Campaign {
    Campaign {
        id: "camp-1".to_string(),
        cpm_rate: "0.03".parse().unwrap(),
        required_views: 10_000,
        budget: "1000".parse().unwrap(),
        total_spent: Decimal::ZERO,
        created_at: Utc::now(),
    }
}

/// Create a test submission in the given status
pub fn create_test_submission(status: SubmissionStatus) -> Submission {
    let mut submission = Submission::new(
        "camp-1",
        "clipper-1",
        "https://www.tiktok.com/@clipper/video/7311234567890123456",
    );
    submission.status = status;
    submission
}

/// Payment client that records calls and can be told to fail
pub struct MockPaymentClient {
    pub calls: AtomicUsize,
    pub fail_next: Mutex<bool>,
    pub has_destination: bool,
}

impl MockPaymentClient {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_next: Mutex::new(false),
            has_destination: true,
        }
    }

    pub fn without_destination() -> Self {
        Self {
            has_destination: false,
            ..Self::new()
        }
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentClient for MockPaymentClient {
    async fn initiate_payout(
        &self,
        _clipper_id: &str,
        _amount: Decimal,
        submission_id: &str,
    ) -> Result<PayoutReceipt, PayoutError> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(PayoutError::Rejected("simulated outage".to_string()));
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PayoutReceipt {
            transfer_id: format!("tr_{submission_id}_{call}"),
        })
    }

    async fn has_payout_destination(&self, _clipper_id: &str) -> Result<bool, PayoutError> {
        Ok(self.has_destination)
    }
}

/// Authorization client with a fixed admin list and token table
pub struct MockAuthClient {
    pub admins: Vec<String>,
    pub tokens: std::collections::HashMap<String, String>,
}

impl MockAuthClient {
    pub fn with_admin(admin_id: &str) -> Self {
        Self {
            admins: vec![admin_id.to_string()],
            tokens: std::collections::HashMap::new(),
        }
    }
}

#[async_trait]
impl AuthorizationClient for MockAuthClient {
    async fn is_admin(&self, user_id: &str) -> Result<bool, AdminError> {
        Ok(self.admins.iter().any(|id| id == user_id))
    }

    async fn access_token_for(&self, clipper_id: &str) -> Result<Option<String>, AdminError> {
        Ok(self.tokens.get(clipper_id).cloned())
    }
}

/// Acquirer that replays a scripted sequence of view counts
pub struct SequenceAcquirer {
    views: Mutex<VecDeque<u64>>,
}

impl SequenceAcquirer {
    pub fn new(views: impl IntoIterator<Item = u64>) -> Self {
        Self {
            views: Mutex::new(views.into_iter().collect()),
        }
    }
}

#[async_trait]
impl MetricsAcquirer for SequenceAcquirer {
    async fn acquire(
        &self,
        _clipper_id: Option<&str>,
        _video_url: &str,
    ) -> Result<VideoMetrics, AcquireError> {
        let views = self
            .views
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(AcquireError::Exhausted)?;

        Ok(VideoMetrics {
            views,
            likes: 0,
            comments: 0,
            shares: 0,
            source: MetricsSource::Scrape,
        })
    }
}
