//! Repository pattern for submission and campaign persistence
//!
//! Trait-based repositories decouple the pipeline from storage, enabling
//! mock implementations in tests and swappable backends. The SQLite
//! implementation is the production default.
//!
//! The payout-committing write is a compare-and-swap on
//! `(id, paid_views)`: two overlapping scheduler runs can both read the
//! same pre-payout snapshot, but only one commit can advance the
//! watermark; the loser affects zero rows and must treat the payout as
//! already processed.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{
    Campaign, MetricsSource, Submission, SubmissionStatus, TransitionError, VideoMetrics,
};

// ============================================================================
// Repository Traits
// ============================================================================

/// Repository for submission records
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Get a submission by id
    async fn get_submission(&self, id: &str) -> Result<Option<Submission>>;

    /// Insert a new submission
    async fn insert_submission(&self, submission: &Submission) -> Result<()>;

    /// List submissions the batch scheduler should refresh
    async fn list_refreshable(&self) -> Result<Vec<Submission>>;

    /// List submissions with the given status
    async fn list_by_status(&self, status: SubmissionStatus) -> Result<Vec<Submission>>;

    /// Write a metrics refresh
    ///
    /// Views are clamped monotonic non-decreasing; a rejected submission
    /// refuses the write with a terminal-state error.
    async fn update_metrics(&self, id: &str, metrics: &VideoMetrics) -> Result<Submission>;

    /// Guarded status transition; returns false when the row was not in
    /// `from` anymore (another writer got there first)
    async fn set_status(
        &self,
        id: &str,
        from: SubmissionStatus,
        to: SubmissionStatus,
    ) -> Result<bool>;

    /// Admin approval: pending -> approved, recording the admin
    async fn approve(&self, id: &str, admin_id: &str) -> Result<bool>;

    /// Admin rejection: terminal, freezes the record
    async fn reject(&self, id: &str, admin_id: &str, notes: Option<&str>) -> Result<Submission>;

    /// Commit a payout with a compare-and-swap on the watermark
    ///
    /// Returns false when `paid_views` no longer equals
    /// `expected_paid_views` — a concurrent runner already committed.
    async fn commit_payout(
        &self,
        id: &str,
        expected_paid_views: u64,
        new_paid_views: u64,
        new_accrued: Decimal,
        paid_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Repository for campaign records (read-only to the pipeline)
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Get a campaign by id
    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>>;

    /// Insert a campaign (used by fixtures and seeding)
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<()>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite store implementing both repositories
///
/// Uses a `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a store backed by a database file
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL,
                clipper_id TEXT NOT NULL,
                video_url TEXT NOT NULL,
                views INTEGER NOT NULL DEFAULT 0,
                likes INTEGER NOT NULL DEFAULT 0,
                comments INTEGER NOT NULL DEFAULT 0,
                shares INTEGER NOT NULL DEFAULT 0,
                paid_views INTEGER NOT NULL DEFAULT 0,
                earnings_accrued TEXT NOT NULL DEFAULT '0',
                status TEXT NOT NULL DEFAULT 'pending',
                metrics_source TEXT,
                admin_validated_by TEXT,
                admin_notes TEXT,
                created_at TEXT NOT NULL,
                paid_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_submissions_status
                ON submissions(status);

            CREATE INDEX IF NOT EXISTS idx_submissions_campaign
                ON submissions(campaign_id);

            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                cpm_rate TEXT NOT NULL,
                required_views INTEGER NOT NULL,
                budget TEXT NOT NULL DEFAULT '0',
                total_spent TEXT NOT NULL DEFAULT '0',
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

fn parse_decimal(idx: usize, text: &str) -> rusqlite::Result<Decimal> {
    text.parse::<Decimal>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_submission(row: &Row<'_>) -> rusqlite::Result<Submission> {
    let earnings_text: String = row.get(9)?;
    let status_text: String = row.get(10)?;
    let source_text: Option<String> = row.get(11)?;
    let created_text: String = row.get(14)?;
    let paid_text: Option<String> = row.get(15)?;

    Ok(Submission {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        clipper_id: row.get(2)?,
        video_url: row.get(3)?,
        views: row.get::<_, i64>(4)? as u64,
        likes: row.get::<_, i64>(5)? as u64,
        comments: row.get::<_, i64>(6)? as u64,
        shares: row.get::<_, i64>(7)? as u64,
        paid_views: row.get::<_, i64>(8)? as u64,
        earnings_accrued: parse_decimal(9, &earnings_text)?,
        status: SubmissionStatus::parse(&status_text).unwrap_or(SubmissionStatus::Pending),
        metrics_source: source_text.as_deref().and_then(MetricsSource::parse),
        admin_validated_by: row.get(12)?,
        admin_notes: row.get(13)?,
        created_at: parse_timestamp(14, &created_text)?,
        paid_at: paid_text.as_deref().map(|t| parse_timestamp(15, t)).transpose()?,
    })
}

const SUBMISSION_COLUMNS: &str = "id, campaign_id, clipper_id, video_url, views, likes, comments, \
     shares, paid_views, earnings_accrued, status, metrics_source, admin_validated_by, \
     admin_notes, created_at, paid_at";

#[async_trait]
impl SubmissionRepository for SqliteStore {
    async fn get_submission(&self, id: &str) -> Result<Option<Submission>> {
        let conn = self.conn.lock().unwrap();
        let query = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1");

        let submission = conn
            .query_row(&query, params![id], row_to_submission)
            .optional()?;

        Ok(submission)
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO submissions
                (id, campaign_id, clipper_id, video_url, views, likes, comments, shares,
                 paid_views, earnings_accrued, status, metrics_source, admin_validated_by,
                 admin_notes, created_at, paid_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                submission.id,
                submission.campaign_id,
                submission.clipper_id,
                submission.video_url,
                submission.views as i64,
                submission.likes as i64,
                submission.comments as i64,
                submission.shares as i64,
                submission.paid_views as i64,
                submission.earnings_accrued.to_string(),
                submission.status.as_str(),
                submission.metrics_source.map(|s| s.as_str()),
                submission.admin_validated_by,
                submission.admin_notes,
                submission.created_at.to_rfc3339(),
                submission.paid_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    async fn list_refreshable(&self) -> Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE status IN ('pending', 'approved', 'ready_for_payment') \
             ORDER BY created_at"
        );

        let mut stmt = conn.prepare(&query)?;
        let submissions = stmt
            .query_map([], row_to_submission)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(submissions)
    }

    async fn list_by_status(&self, status: SubmissionStatus) -> Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE status = ?1 ORDER BY created_at"
        );

        let mut stmt = conn.prepare(&query)?;
        let submissions = stmt
            .query_map(params![status.as_str()], row_to_submission)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(submissions)
    }

    async fn update_metrics(&self, id: &str, metrics: &VideoMetrics) -> Result<Submission> {
        let conn = self.conn.lock().unwrap();
        let query = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1");

        let current = conn
            .query_row(&query, params![id], row_to_submission)
            .optional()?
            .ok_or_else(|| Error::not_found("submission", id))?;

        if current.status.is_terminal() {
            return Err(TransitionError::Terminal {
                id: id.to_string(),
                status: current.status,
            }
            .into());
        }

        // Views only ever move forward; a lower scrape result is platform noise
        conn.execute(
            r#"
            UPDATE submissions
               SET views = MAX(views, ?1), likes = ?2, comments = ?3, shares = ?4,
                   metrics_source = ?5
             WHERE id = ?6 AND status != 'rejected'
            "#,
            params![
                metrics.views as i64,
                metrics.likes as i64,
                metrics.comments as i64,
                metrics.shares as i64,
                metrics.source.as_str(),
                id,
            ],
        )?;

        let updated = conn.query_row(&query, params![id], row_to_submission)?;
        Ok(updated)
    }

    async fn set_status(
        &self,
        id: &str,
        from: SubmissionStatus,
        to: SubmissionStatus,
    ) -> Result<bool> {
        from.transition(to)?;

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE submissions SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![to.as_str(), id, from.as_str()],
        )?;

        Ok(rows > 0)
    }

    async fn approve(&self, id: &str, admin_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE submissions SET status = 'approved', admin_validated_by = ?1 \
             WHERE id = ?2 AND status = 'pending'",
            params![admin_id, id],
        )?;

        Ok(rows > 0)
    }

    async fn reject(&self, id: &str, admin_id: &str, notes: Option<&str>) -> Result<Submission> {
        let conn = self.conn.lock().unwrap();
        let query = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1");

        let current = conn
            .query_row(&query, params![id], row_to_submission)
            .optional()?
            .ok_or_else(|| Error::not_found("submission", id))?;

        current.status.transition(SubmissionStatus::Rejected)?;

        conn.execute(
            "UPDATE submissions SET status = 'rejected', admin_validated_by = ?1, admin_notes = ?2 \
             WHERE id = ?3 AND status = ?4",
            params![admin_id, notes, id, current.status.as_str()],
        )?;

        let updated = conn.query_row(&query, params![id], row_to_submission)?;
        Ok(updated)
    }

    async fn commit_payout(
        &self,
        id: &str,
        expected_paid_views: u64,
        new_paid_views: u64,
        new_accrued: Decimal,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        let rows = conn.execute(
            r#"
            UPDATE submissions
               SET paid_views = ?1, earnings_accrued = ?2, status = 'paid', paid_at = ?3
             WHERE id = ?4 AND paid_views = ?5 AND status != 'rejected'
            "#,
            params![
                new_paid_views as i64,
                new_accrued.to_string(),
                paid_at.to_rfc3339(),
                id,
                expected_paid_views as i64,
            ],
        )?;

        Ok(rows > 0)
    }
}

#[async_trait]
impl CampaignRepository for SqliteStore {
    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let conn = self.conn.lock().unwrap();

        let campaign = conn
            .query_row(
                "SELECT id, cpm_rate, required_views, budget, total_spent, created_at \
                 FROM campaigns WHERE id = ?1",
                params![id],
                |row| {
                    let cpm_text: String = row.get(1)?;
                    let budget_text: String = row.get(3)?;
                    let spent_text: String = row.get(4)?;
                    let created_text: String = row.get(5)?;

                    Ok(Campaign {
                        id: row.get(0)?,
                        cpm_rate: parse_decimal(1, &cpm_text)?,
                        required_views: row.get::<_, i64>(2)? as u64,
                        budget: parse_decimal(3, &budget_text)?,
                        total_spent: parse_decimal(4, &spent_text)?,
                        created_at: parse_timestamp(5, &created_text)?,
                    })
                },
            )
            .optional()?;

        Ok(campaign)
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO campaigns (id, cpm_rate, required_views, budget, total_spent, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                campaign.id,
                campaign.cpm_rate.to_string(),
                campaign.required_views as i64,
                campaign.budget.to_string(),
                campaign.total_spent.to_string(),
                campaign.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricsSource;

    fn test_campaign() -> Campaign {
        Campaign {
            id: "camp-1".to_string(),
            cpm_rate: "0.03".parse().unwrap(),
            required_views: 10_000,
            budget: "1000".parse().unwrap(),
            total_spent: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    fn test_submission() -> Submission {
        Submission::new("camp-1", "clipper-1", "https://www.tiktok.com/@a/video/123")
    }

    #[tokio::test]
    async fn test_insert_and_get_submission() {
        let store = SqliteStore::in_memory().unwrap();
        let submission = test_submission();

        store.insert_submission(&submission).await.unwrap();

        let loaded = store.get_submission(&submission.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, submission.id);
        assert_eq!(loaded.status, SubmissionStatus::Pending);
        assert_eq!(loaded.views, 0);
        assert_eq!(loaded.earnings_accrued, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_get_missing_submission() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_submission("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_metrics_monotonic_views() {
        let store = SqliteStore::in_memory().unwrap();
        let submission = test_submission();
        store.insert_submission(&submission).await.unwrap();

        let refresh = VideoMetrics {
            views: 5_000,
            likes: 10,
            comments: 2,
            shares: 1,
            source: MetricsSource::Scrape,
        };
        let updated = store.update_metrics(&submission.id, &refresh).await.unwrap();
        assert_eq!(updated.views, 5_000);

        // A lower count must not move views backwards
        let lower = VideoMetrics {
            views: 3_000,
            likes: 12,
            comments: 3,
            shares: 1,
            source: MetricsSource::Scrape,
        };
        let updated = store.update_metrics(&submission.id, &lower).await.unwrap();
        assert_eq!(updated.views, 5_000);
        assert_eq!(updated.likes, 12);
        assert_eq!(updated.metrics_source, Some(MetricsSource::Scrape));
    }

    #[tokio::test]
    async fn test_update_metrics_rejected_is_frozen() {
        let store = SqliteStore::in_memory().unwrap();
        let submission = test_submission();
        store.insert_submission(&submission).await.unwrap();
        store.reject(&submission.id, "admin-1", Some("spam")).await.unwrap();

        let refresh = VideoMetrics {
            views: 99_999,
            likes: 0,
            comments: 0,
            shares: 0,
            source: MetricsSource::Scrape,
        };
        let result = store.update_metrics(&submission.id, &refresh).await;
        assert!(matches!(result, Err(Error::Transition(_))));

        let loaded = store.get_submission(&submission.id).await.unwrap().unwrap();
        assert_eq!(loaded.views, 0);
        assert_eq!(loaded.status, SubmissionStatus::Rejected);
    }

    #[tokio::test]
    async fn test_set_status_guarded() {
        let store = SqliteStore::in_memory().unwrap();
        let submission = test_submission();
        store.insert_submission(&submission).await.unwrap();

        let ok = store
            .set_status(&submission.id, SubmissionStatus::Pending, SubmissionStatus::Approved)
            .await
            .unwrap();
        assert!(ok);

        // Second identical transition loses the status CAS
        let ok = store
            .set_status(&submission.id, SubmissionStatus::Pending, SubmissionStatus::Approved)
            .await
            .unwrap();
        assert!(!ok);

        // Invalid edges are refused before touching the database
        let result = store
            .set_status(&submission.id, SubmissionStatus::Approved, SubmissionStatus::Pending)
            .await;
        assert!(matches!(result, Err(Error::Transition(_))));
    }

    #[tokio::test]
    async fn test_reject_terminal() {
        let store = SqliteStore::in_memory().unwrap();
        let submission = test_submission();
        store.insert_submission(&submission).await.unwrap();

        let rejected = store
            .reject(&submission.id, "admin-1", Some("wrong campaign"))
            .await
            .unwrap();
        assert_eq!(rejected.status, SubmissionStatus::Rejected);
        assert_eq!(rejected.admin_validated_by.as_deref(), Some("admin-1"));
        assert_eq!(rejected.admin_notes.as_deref(), Some("wrong campaign"));

        // Rejecting twice violates the state machine
        let result = store.reject(&submission.id, "admin-1", None).await;
        assert!(matches!(result, Err(Error::Transition(_))));
    }

    #[tokio::test]
    async fn test_commit_payout_cas() {
        let store = SqliteStore::in_memory().unwrap();
        let mut submission = test_submission();
        submission.status = SubmissionStatus::ReadyForPayment;
        submission.views = 40_000;
        store.insert_submission(&submission).await.unwrap();

        let amount: Decimal = "1.20".parse().unwrap();
        let committed = store
            .commit_payout(&submission.id, 0, 40_000, amount, Utc::now())
            .await
            .unwrap();
        assert!(committed);

        let loaded = store.get_submission(&submission.id).await.unwrap().unwrap();
        assert_eq!(loaded.paid_views, 40_000);
        assert_eq!(loaded.status, SubmissionStatus::Paid);
        assert_eq!(loaded.earnings_accrued, amount);
        assert!(loaded.paid_at.is_some());

        // Replaying the same commit loses the CAS: watermark moved
        let committed = store
            .commit_payout(&submission.id, 0, 40_000, amount, Utc::now())
            .await
            .unwrap();
        assert!(!committed);
    }

    #[tokio::test]
    async fn test_list_refreshable_excludes_terminal() {
        let store = SqliteStore::in_memory().unwrap();

        let pending = test_submission();
        store.insert_submission(&pending).await.unwrap();

        let mut approved = test_submission();
        approved.status = SubmissionStatus::Approved;
        store.insert_submission(&approved).await.unwrap();

        let mut ready = test_submission();
        ready.status = SubmissionStatus::ReadyForPayment;
        store.insert_submission(&ready).await.unwrap();

        let mut paid = test_submission();
        paid.status = SubmissionStatus::Paid;
        store.insert_submission(&paid).await.unwrap();

        let mut rejected = test_submission();
        rejected.status = SubmissionStatus::Rejected;
        store.insert_submission(&rejected).await.unwrap();

        let refreshable = store.list_refreshable().await.unwrap();
        assert_eq!(refreshable.len(), 3);
        assert!(refreshable.iter().all(|s| s.status.is_refreshable()));
    }

    #[tokio::test]
    async fn test_file_backed_store_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("clipfund.db");

        let store = SqliteStore::new(&path).unwrap();
        let submission = test_submission();
        store.insert_submission(&submission).await.unwrap();

        assert!(path.exists());
        assert!(store.get_submission(&submission.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_campaign_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let campaign = test_campaign();

        store.insert_campaign(&campaign).await.unwrap();

        let loaded = store.get_campaign(&campaign.id).await.unwrap().unwrap();
        assert_eq!(loaded.cpm_rate, campaign.cpm_rate);
        assert_eq!(loaded.required_views, 10_000);
        assert!(store.get_campaign("missing").await.unwrap().is_none());
    }
}
