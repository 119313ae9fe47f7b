//! Writes the repository's star, fork and open-issue counts for the site.
//!
//! Runs without arguments. Exits non-zero if the repository cannot be
//! fetched, in which case no file is written.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resilient_fetch::site::{DEFAULT_REPO, DEFAULT_STATS_PATH};
use resilient_fetch::{FetcherOptions, GithubClient, ResilientFetcher, StatsJob};

#[derive(Debug, Parser)]
#[command(name = "fetch-github-stats", version, about)]
struct Args {
    /// Repository as owner/name
    #[arg(long, env = "HOMELAB_REPO", default_value = DEFAULT_REPO)]
    repo: String,

    /// Where to write the JSON file
    #[arg(long, short, default_value = DEFAULT_STATS_PATH)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_fetch=info,fetch_github_stats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let options = FetcherOptions::from_env()?;

    tracing::debug!(?options, "Configuration loaded");

    let github = GithubClient::new(Arc::new(ResilientFetcher::new(options)?));
    let job = StatsJob::new(args.repo, args.output);

    if let Err(e) = job.run(&github).await {
        tracing::error!("Failed to fetch GitHub stats for {}: {}", job.repo(), e);
        if e.is_config_error() {
            tracing::error!("Check --repo and the FETCH_* / GITHUB_* environment variables");
        } else if e.is_recoverable() {
            tracing::warn!("The failure looks transient; rerunning later may succeed");
        }
        return Err(e.into());
    }

    tracing::info!("Successfully fetched and wrote GitHub stats.");
    Ok(())
}
