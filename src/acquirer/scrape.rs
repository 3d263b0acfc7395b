//! Clip page scraping
//!
//! Two rendering routes produce the HTML the extractor reads: the local
//! headless browser (default), or a third-party scraping gateway that
//! renders the page remotely and authenticates per request with an API
//! key. The gateway route is selected by the proxy profile.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;
use tracing::debug;

use crate::config::ProxyProfile;
use crate::parser::{ExtractedCounts, MetricsExtractor};
use crate::utils::error::ScrapeError;

use super::browser::BrowserManager;

/// Pool of realistic User-Agent strings for gateway requests
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Scraping-gateway client
///
/// The gateway renders JavaScript remotely and returns the final HTML;
/// the API key authenticates each request.
pub struct GatewayClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GatewayClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| ScrapeError::Gateway(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch a fully rendered page through the gateway
    pub async fn fetch_rendered(&self, url: &str) -> Result<String, ScrapeError> {
        let user_agent = *USER_AGENTS
            .choose(&mut rand::thread_rng())
            .unwrap_or(&USER_AGENTS[0]);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("url", url),
                ("render_js", "true"),
            ])
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| ScrapeError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::GatewayStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Gateway(e.to_string()))
    }
}

/// Renders a clip page and extracts its counters
pub struct PageScraper {
    browser: Arc<BrowserManager>,
    gateway: Option<GatewayClient>,
    extractor: MetricsExtractor,
}

impl PageScraper {
    /// Build a scraper; a gateway proxy profile routes rendering remotely
    pub fn new(
        browser: Arc<BrowserManager>,
        proxy: Option<&ProxyProfile>,
        timeout: Duration,
    ) -> Result<Self, ScrapeError> {
        let gateway = match proxy {
            Some(ProxyProfile::Gateway { endpoint, api_key }) => {
                Some(GatewayClient::new(endpoint, api_key, timeout)?)
            }
            _ => None,
        };

        Ok(Self {
            browser,
            gateway,
            extractor: MetricsExtractor::new(),
        })
    }

    /// Render the clip page and extract its counters
    pub async fn scrape(&self, url: &str) -> Result<ExtractedCounts, ScrapeError> {
        let html = match &self.gateway {
            Some(gateway) => {
                debug!(url = %url, "Rendering clip page via scraping gateway");
                gateway.fetch_rendered(url).await?
            }
            None => {
                debug!(url = %url, "Rendering clip page via headless browser");
                let lease = self.browser.acquire().await?;
                lease.fetch_rendered(url).await?
            }
        };

        Ok(self.extractor.extract(&html))
    }
}
