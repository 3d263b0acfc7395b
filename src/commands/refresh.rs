//! `refresh` command: refresh one submission or scrape one URL

use anyhow::Result;

use crate::config::Config;

use super::build_pipeline;

/// Refresh a single submission by id, or scrape a bare URL
pub async fn refresh(
    config: Config,
    submission_id: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let pipeline = build_pipeline(&config)?;

    let result = run(&pipeline, submission_id, url).await;

    pipeline.browser.shutdown().await;
    result
}

async fn run(
    pipeline: &super::Pipeline,
    submission_id: Option<String>,
    url: Option<String>,
) -> Result<()> {
    match (submission_id, url) {
        (Some(id), _) => {
            let outcome = pipeline.scheduler.process_submission(&id).await?;

            println!("Submission:        {}", outcome.submission_id);
            println!("Views:             {}", outcome.views);
            println!("Potential:         {}", outcome.earnings_potential);
            println!("Meets requirement: {}", outcome.meets_requirement);
            println!("Status:            {}", outcome.status);
            if let Some(payout) = outcome.payout {
                if payout.triggered {
                    println!("Payout:            {} ({})", payout.amount, payout.transfer_id.as_deref().unwrap_or("-"));
                } else {
                    println!("Payout:            skipped ({:?})", payout.skipped);
                }
            }
        }
        (None, Some(url)) => {
            let metrics = pipeline.scheduler.scrape_url(&url).await?;

            println!("Views:    {}", metrics.views);
            println!("Likes:    {}", metrics.likes);
            println!("Comments: {}", metrics.comments);
            println!("Shares:   {}", metrics.shares);
            println!("Source:   {}", metrics.source);
        }
        (None, None) => {
            anyhow::bail!("refresh needs --submission <id> or --url <url>");
        }
    }

    Ok(())
}
