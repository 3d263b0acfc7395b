//! `serve` command: run the pipeline HTTP server
//!
//! The headless browser is the one resource that outlives individual
//! requests, so shutdown ordering matters: the server drains first, then
//! the browser closes.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::server::{AppState, PipelineServer};

use super::build_pipeline;

/// Run the HTTP server until a shutdown signal arrives
pub async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = bind {
        config.server.bind_address = addr;
    }

    if let Err(e) = crate::metrics::init_metrics() {
        warn!(error = %e, "Metrics initialization failed; continuing without metrics");
    }

    let pipeline = build_pipeline(&config)?;

    let state = AppState {
        scheduler: pipeline.scheduler.clone(),
        admin: pipeline.admin.clone(),
        submissions: pipeline.store.clone(),
        campaigns: pipeline.store.clone(),
        payment: pipeline.payment.clone(),
        auth: pipeline.auth.clone(),
        start_time: Instant::now(),
    };

    let server = PipelineServer::new(config.server.clone(), state);

    server.start_with_shutdown(shutdown_signal()).await?;

    // Server drained; release the browser before exiting
    pipeline.browser.shutdown().await;
    info!("Pipeline server stopped");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
