//! Caches technology logos (GitHub avatars) for the landing page.
//!
//! Runs without arguments. Logos already on disk are left alone. A logo that
//! cannot be fetched is logged and skipped; the run still exits 0.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resilient_fetch::core::DEFAULT_PACING;
use resilient_fetch::site::{default_targets, DEFAULT_LOGO_DIR};
use resilient_fetch::{FetcherOptions, GithubClient, LogoJob, ResilientFetcher};

#[derive(Debug, Parser)]
#[command(name = "fetch-tech-logos", version, about)]
struct Args {
    /// Directory the PNG files are written to
    #[arg(long, short, default_value = DEFAULT_LOGO_DIR)]
    dir: PathBuf,

    /// Milliseconds between requests for different resources; 0 disables pacing
    #[arg(long, default_value_t = DEFAULT_PACING.as_millis() as u64)]
    pacing_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_fetch=info,fetch_tech_logos=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut options = FetcherOptions::from_env()?;
    options.pacing = Some(Duration::from_millis(args.pacing_ms));

    tracing::debug!(?options, "Configuration loaded");

    let github = GithubClient::new(Arc::new(ResilientFetcher::new(options)?));
    let report = LogoJob::new(args.dir, default_targets()).run(&github).await?;

    for (slug, reason) in &report.failed {
        tracing::warn!("No logo for {}: {}", slug, reason);
    }

    Ok(())
}
