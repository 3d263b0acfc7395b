//! HTTP server for the pipeline action endpoints
//!
//! This module provides the axum server that exposes the batch refresh,
//! single-URL scrape, submission update, and admin validation actions,
//! plus health and metrics endpoints.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::admin::{AdminOverride, AuthorizationClient};
use crate::config::ServerConfig;
use crate::payout::PaymentClient;
use crate::scheduler::BatchScheduler;
use crate::storage::{CampaignRepository, SubmissionRepository};

use api::create_router;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid server configuration: {0}")]
    ConfigError(String),

    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server failed: {0}")]
    ServeError(std::io::Error),
}

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Batch scheduler (also drives single-submission refreshes)
    pub scheduler: Arc<BatchScheduler>,

    /// Admin override
    pub admin: Arc<AdminOverride>,

    /// Submission repository
    pub submissions: Arc<dyn SubmissionRepository>,

    /// Campaign repository
    pub campaigns: Arc<dyn CampaignRepository>,

    /// Payment collaborator (payout-destination enrichment)
    pub payment: Arc<dyn PaymentClient>,

    /// Authorization collaborator (ownership checks)
    pub auth: Arc<dyn AuthorizationClient>,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Pipeline Server
// ============================================================================

/// Main HTTP server
pub struct PipelineServer {
    config: ServerConfig,
    state: AppState,
}

impl PipelineServer {
    /// Create a new server over pre-built pipeline components
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        // Add CORS layer if enabled
        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting pipeline server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::BindError { addr, source })?;

        axum::serve(listener, router)
            .await
            .map_err(ServerError::ServeError)?;

        Ok(())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(
            "Starting pipeline server on {} (with graceful shutdown)",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::BindError { addr, source })?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::ServeError)?;

        Ok(())
    }
}
