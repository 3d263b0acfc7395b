//! Configuration management for the clipfund pipeline
//!
//! This module handles loading and validating configuration from environment
//! variables and files.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// View-count acquisition configuration
    pub acquirer: AcquirerConfig,

    /// Payout gate configuration
    pub payout: PayoutConfig,

    /// Batch scheduler configuration
    pub scheduler: SchedulerConfig,

    /// External collaborator endpoints
    pub collaborators: CollaboratorConfig,

    /// Optional scraping proxy profile
    #[serde(default)]
    pub proxy: Option<ProxyProfile>,

    /// Database configuration
    pub database: DatabaseConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// View-count acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquirerConfig {
    /// Maximum retry attempts per strategy
    pub max_retries: u32,

    /// Fixed delay between retry attempts in seconds
    pub retry_delay_secs: u64,

    /// Page navigation / API request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit for outbound platform requests (requests per second)
    pub rate_limit: u32,
}

/// Payout gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Minimum delta earnings required to trigger a payout
    pub minimum_threshold: Decimal,
}

/// Batch scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay between submissions within a batch, in seconds
    pub item_delay_secs: u64,
}

/// External collaborator endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    /// Official platform metrics API base URL
    pub metrics_api_url: String,

    /// Payment service base URL
    pub payment_api_url: String,

    /// Authorization service base URL
    pub auth_api_url: String,
}

/// Scraping proxy profile, selected by which credentials are present
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProxyProfile {
    /// Rotating residential proxy, applied as browser launch arguments
    Residential {
        host: String,
        port: u16,
        username: String,
        password: String,
    },

    /// Third-party scraping gateway, authenticated per request
    Gateway { endpoint: String, api_key: String },
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub bind_address: SocketAddr,

    /// Enable permissive CORS (dashboard runs on another origin)
    pub enable_cors: bool,

    /// Enable per-request tracing
    pub enable_request_logging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let max_retries = env_parse("CLIPFUND_MAX_RETRIES", 3);
        let retry_delay_secs = env_parse("CLIPFUND_RETRY_DELAY_SECS", 2);
        let request_timeout_secs = env_parse("CLIPFUND_REQUEST_TIMEOUT", 30);
        let rate_limit = env_parse("CLIPFUND_RATE_LIMIT", 2);

        let minimum_threshold = std::env::var("CLIPFUND_MIN_PAYOUT")
            .ok()
            .and_then(|v| v.parse::<Decimal>().ok())
            .unwrap_or_else(|| Decimal::new(100, 2));

        let item_delay_secs = env_parse("CLIPFUND_BATCH_ITEM_DELAY_SECS", 2);

        let metrics_api_url = std::env::var("CLIPFUND_METRICS_API_URL")
            .unwrap_or_else(|_| String::from("https://open.tiktokapis.com/v2"));
        let payment_api_url = std::env::var("CLIPFUND_PAYMENT_API_URL")
            .unwrap_or_else(|_| String::from("http://localhost:8600"));
        let auth_api_url = std::env::var("CLIPFUND_AUTH_API_URL")
            .unwrap_or_else(|_| String::from("http://localhost:8500"));

        let sqlite_path = std::env::var("CLIPFUND_SQLITE_PATH")
            .unwrap_or_else(|_| String::from("data/clipfund.db"))
            .into();

        let bind_address = std::env::var("CLIPFUND_BIND_ADDRESS")
            .unwrap_or_else(|_| String::from("0.0.0.0:8080"))
            .parse()
            .context("Invalid CLIPFUND_BIND_ADDRESS")?;

        let log_level = std::env::var("CLIPFUND_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let log_format =
            std::env::var("CLIPFUND_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            acquirer: AcquirerConfig {
                max_retries,
                retry_delay_secs,
                request_timeout_secs,
                rate_limit,
            },
            payout: PayoutConfig { minimum_threshold },
            scheduler: SchedulerConfig { item_delay_secs },
            collaborators: CollaboratorConfig {
                metrics_api_url,
                payment_api_url,
                auth_api_url,
            },
            proxy: ProxyProfile::from_env(),
            database: DatabaseConfig { sqlite_path },
            server: ServerConfig {
                bind_address,
                enable_cors: true,
                enable_request_logging: true,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.acquirer.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.acquirer.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.payout.minimum_threshold < Decimal::ZERO {
            anyhow::bail!("minimum_threshold must not be negative");
        }

        if let Some(ProxyProfile::Residential { host, .. }) = &self.proxy {
            if host.is_empty() {
                anyhow::bail!("proxy host cannot be empty");
            }
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.acquirer.request_timeout_secs)
    }

    /// Get retry delay as Duration
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.acquirer.retry_delay_secs)
    }

    /// Get inter-item batch delay as Duration
    #[must_use]
    pub fn item_delay(&self) -> Duration {
        Duration::from_secs(self.scheduler.item_delay_secs)
    }
}

impl ProxyProfile {
    /// Select a proxy profile from the credentials present in the environment
    ///
    /// Residential credentials win over a gateway key when both are set.
    pub fn from_env() -> Option<Self> {
        let residential = || {
            let host = std::env::var("CLIPFUND_PROXY_HOST").ok()?;
            let port = std::env::var("CLIPFUND_PROXY_PORT").ok()?.parse().ok()?;
            let username = std::env::var("CLIPFUND_PROXY_USERNAME").ok()?;
            let password = std::env::var("CLIPFUND_PROXY_PASSWORD").ok()?;
            Some(Self::Residential {
                host,
                port,
                username,
                password,
            })
        };

        let gateway = || {
            let api_key = std::env::var("CLIPFUND_GATEWAY_API_KEY").ok()?;
            let endpoint = std::env::var("CLIPFUND_GATEWAY_ENDPOINT")
                .unwrap_or_else(|_| String::from("https://app.scrapingbee.com/api/v1/"));
            Some(Self::Gateway { endpoint, api_key })
        };

        residential().or_else(gateway)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquirer: AcquirerConfig {
                max_retries: 3,
                retry_delay_secs: 2,
                request_timeout_secs: 30,
                rate_limit: 2,
            },
            payout: PayoutConfig {
                minimum_threshold: Decimal::new(100, 2),
            },
            scheduler: SchedulerConfig { item_delay_secs: 2 },
            collaborators: CollaboratorConfig {
                metrics_api_url: String::from("https://open.tiktokapis.com/v2"),
                payment_api_url: String::from("http://localhost:8600"),
                auth_api_url: String::from("http://localhost:8500"),
            },
            proxy: None,
            database: DatabaseConfig {
                sqlite_path: PathBuf::from("data/clipfund.db"),
            },
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".parse().expect("valid default bind address"),
                enable_cors: true,
                enable_request_logging: true,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
