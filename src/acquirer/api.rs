//! Official platform metrics API client
//!
//! When a clipper has connected their platform account we hold an access
//! token and can ask the platform for exact counters instead of scraping
//! them. The contract is a single query-by-video-id call.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::utils::error::AcquireError;

/// Counters as reported by the platform's video-metrics endpoint
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApiVideoMetrics {
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub share_count: u64,
}

/// Official metrics API collaborator contract
#[async_trait]
pub trait MetricsApi: Send + Sync {
    /// Query counters for a video on behalf of its owner
    async fn query_video_metrics(
        &self,
        video_id: &str,
        access_token: &str,
    ) -> Result<ApiVideoMetrics, AcquireError>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    videos: Vec<ApiVideoMetrics>,
}

/// HTTP implementation against the platform's open API
pub struct HttpMetricsApi {
    client: Client,
    base_url: String,
}

impl HttpMetricsApi {
    /// Create a client for the given API base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AcquireError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetricsApi for HttpMetricsApi {
    async fn query_video_metrics(
        &self,
        video_id: &str,
        access_token: &str,
    ) -> Result<ApiVideoMetrics, AcquireError> {
        let url = format!("{}/video/query/", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .query(&[(
                "fields",
                "view_count,like_count,comment_count,share_count",
            )])
            .json(&serde_json::json!({
                "filters": { "video_ids": [video_id] }
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::ApiStatus(status.as_u16()));
        }

        let body: QueryResponse = response.json().await?;

        body.data
            .videos
            .into_iter()
            .next()
            .ok_or_else(|| AcquireError::ApiResponse("no video in query response".to_string()))
    }
}
