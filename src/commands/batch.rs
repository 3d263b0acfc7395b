//! `batch` command: one scheduler pass over all eligible submissions

use anyhow::Result;
use tracing::info;

use crate::config::Config;

use super::build_pipeline;

/// Run a single batch refresh and print the aggregate counts
pub async fn batch(config: Config) -> Result<()> {
    let pipeline = build_pipeline(&config)?;

    let stats = pipeline.scheduler.run_all().await?;

    pipeline.browser.shutdown().await;

    info!(
        processed = stats.processed,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "Batch run finished"
    );

    println!("Processed: {}", stats.processed);
    println!("Succeeded: {}", stats.succeeded);
    println!("Failed:    {}", stats.failed);

    Ok(())
}
