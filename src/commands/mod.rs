//! CLI command implementations

pub mod batch;
pub mod refresh;
pub mod serve;

// Re-export command functions for convenience
pub use batch::batch;
pub use refresh::refresh;
pub use serve::serve;

use std::sync::Arc;

use anyhow::Result;

use crate::acquirer::{
    BrowserManager, BrowserSettings, HttpMetricsApi, MetricsAcquirer, PageScraper,
    ViewCountAcquirer,
};
use crate::admin::{AdminOverride, AuthorizationClient, HttpAuthorizationClient};
use crate::config::Config;
use crate::payout::{HttpPaymentClient, PaymentClient, PayoutTrigger};
use crate::scheduler::BatchScheduler;
use crate::storage::SqliteStore;

/// Wired pipeline components shared by the commands
pub struct Pipeline {
    pub store: Arc<SqliteStore>,
    pub browser: Arc<BrowserManager>,
    pub scheduler: Arc<BatchScheduler>,
    pub admin: Arc<AdminOverride>,
    pub payment: Arc<dyn PaymentClient>,
    pub auth: Arc<dyn AuthorizationClient>,
}

/// Build the pipeline from configuration
pub fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let store = Arc::new(SqliteStore::new(&config.database.sqlite_path)?);

    let browser = Arc::new(BrowserManager::new(BrowserSettings {
        navigation_timeout: config.request_timeout(),
        proxy: config.proxy.clone(),
    }));

    let scraper = PageScraper::new(
        Arc::clone(&browser),
        config.proxy.as_ref(),
        config.request_timeout(),
    )?;

    let metrics_api = Arc::new(HttpMetricsApi::new(
        &config.collaborators.metrics_api_url,
        config.request_timeout(),
    )?);

    let auth: Arc<dyn AuthorizationClient> = Arc::new(HttpAuthorizationClient::new(
        &config.collaborators.auth_api_url,
        config.request_timeout(),
    )?);

    let payment: Arc<dyn PaymentClient> = Arc::new(HttpPaymentClient::new(
        &config.collaborators.payment_api_url,
        config.request_timeout(),
    )?);

    let acquirer: Arc<dyn MetricsAcquirer> = Arc::new(ViewCountAcquirer::new(
        metrics_api,
        Arc::clone(&auth),
        scraper,
        &config.acquirer,
    ));

    let payout = Arc::new(PayoutTrigger::new(
        Arc::clone(&payment),
        store.clone() as Arc<dyn crate::storage::SubmissionRepository>,
        config.payout.minimum_threshold,
    ));

    let scheduler = Arc::new(BatchScheduler::new(
        store.clone(),
        store.clone(),
        acquirer,
        Arc::clone(&payout),
        config.item_delay(),
    ));

    let admin = Arc::new(AdminOverride::new(
        Arc::clone(&auth),
        store.clone(),
        store.clone(),
        payout,
    ));

    Ok(Pipeline {
        store,
        browser,
        scheduler,
        admin,
        payment,
        auth,
    })
}
