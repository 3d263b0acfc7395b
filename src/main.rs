use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipfund::commands;
use clipfund::config::Config;

#[derive(Parser)]
#[command(
    name = "clipfund",
    version,
    about = "Clip campaign verification and payout pipeline",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file (environment otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline HTTP server
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Run one batch refresh over all eligible submissions
    Batch,

    /// Refresh a single submission or scrape a single URL
    Refresh {
        /// Submission id to run through the pipeline
        #[arg(short, long)]
        submission: Option<String>,

        /// Clip URL to scrape without a submission
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    tracing::info!("clipfund pipeline starting");

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting serve command");
            commands::serve(config, bind).await?;
        }

        Commands::Batch => {
            tracing::info!("Starting batch command");
            commands::batch(config).await?;
        }

        Commands::Refresh { submission, url } => {
            tracing::info!(
                submission = ?submission,
                url = ?url,
                "Starting refresh command"
            );
            commands::refresh(config, submission, url).await?;
        }
    }

    tracing::info!("clipfund completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("clipfund=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("clipfund=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
