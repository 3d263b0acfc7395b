//! Headless browser resource manager
//!
//! A single Chromium instance serves every scrape in the process. It is
//! launched lazily on first use, handed out under an exclusive lease so
//! navigations cannot interleave, and closed explicitly when the process
//! receives a shutdown signal.

use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ProxyProfile;
use crate::utils::error::ScrapeError;

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Page navigation timeout
    pub navigation_timeout: Duration,

    /// Optional residential proxy applied as launch arguments
    pub proxy: Option<ProxyProfile>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            proxy: None,
        }
    }
}

struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

/// Owns the process-wide headless browser
///
/// `acquire()` creates the browser if absent and returns an exclusive
/// lease; `shutdown()` closes it. The browser is never shared outside a
/// lease, so concurrent callers serialize instead of racing navigations.
pub struct BrowserManager {
    settings: BrowserSettings,
    state: Mutex<Option<BrowserSession>>,
}

impl BrowserManager {
    /// Create a manager; no browser is launched until the first lease
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(None),
        }
    }

    /// Acquire exclusive access to the browser, launching it if needed
    pub async fn acquire(&self) -> Result<BrowserLease<'_>, ScrapeError> {
        let mut guard = self.state.lock().await;

        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }

        Ok(BrowserLease {
            guard,
            navigation_timeout: self.settings.navigation_timeout,
        })
    }

    /// Close the browser if one is running
    ///
    /// Wired to SIGINT/SIGTERM in the binary; safe to call when no
    /// browser was ever launched.
    pub async fn shutdown(&self) {
        let mut guard = self.state.lock().await;

        if let Some(mut session) = guard.take() {
            info!("Closing headless browser");
            if let Err(e) = session.browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
            session.handler_task.abort();
        }
    }

    async fn launch(&self) -> Result<BrowserSession, ScrapeError> {
        info!("Launching headless browser");

        let mut args: Vec<String> = vec![
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--remote-debugging-port=0".to_string(),
        ];

        if let Some(ProxyProfile::Residential { host, port, .. }) = &self.settings.proxy {
            args.push(format!("--proxy-server=http://{host}:{port}"));
        }

        let config = BrowserConfig::builder()
            .new_headless_mode()
            .args(args)
            .build()
            .map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        // Give the browser a moment to settle before the first page
        tokio::time::sleep(Duration::from_millis(300)).await;

        debug!("Headless browser ready");

        Ok(BrowserSession {
            browser,
            handler_task,
        })
    }
}

/// Exclusive, scoped access to the running browser
///
/// Dropping the lease releases the browser for the next caller; the
/// browser itself stays alive.
pub struct BrowserLease<'a> {
    guard: MutexGuard<'a, Option<BrowserSession>>,
    navigation_timeout: Duration,
}

impl BrowserLease<'_> {
    /// Navigate to a URL and return the fully rendered document HTML
    pub async fn fetch_rendered(&self, url: &str) -> Result<String, ScrapeError> {
        let session = self
            .guard
            .as_ref()
            .expect("lease always holds a live session");

        let html = tokio::time::timeout(self.navigation_timeout, async {
            let page = session
                .browser
                .new_page(url)
                .await
                .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

            page.wait_for_navigation()
                .await
                .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

            let html = page
                .content()
                .await
                .map_err(|e| ScrapeError::Eval(e.to_string()))?;

            if let Err(e) = page.close().await {
                debug!(error = %e, "Page close failed; handler will reap it");
            }

            Ok::<String, ScrapeError>(html)
        })
        .await
        .map_err(|_| ScrapeError::Timeout(self.navigation_timeout))??;

        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = BrowserSettings::default();
        assert_eq!(settings.navigation_timeout, Duration::from_secs(30));
        assert!(settings.proxy.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_without_launch_is_noop() {
        let manager = BrowserManager::new(BrowserSettings::default());
        // Never acquired, nothing to close
        manager.shutdown().await;
        assert!(manager.state.lock().await.is_none());
    }
}
