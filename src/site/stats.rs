use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::github::{validate_repo, GithubClient, RepoStats};
use crate::utils::write_json_pretty;

pub const DEFAULT_REPO: &str = "theepicsaxguy/homelab";
pub const DEFAULT_STATS_PATH: &str = "src/data/github-stats.json";

/// Writes `{ "stars", "forks", "issues" }` for one repository.
#[derive(Debug, Clone)]
pub struct StatsJob {
    repo: String,
    output: PathBuf,
}

impl Default for StatsJob {
    fn default() -> Self {
        Self::new(DEFAULT_REPO, DEFAULT_STATS_PATH)
    }
}

impl StatsJob {
    pub fn new(repo: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            output: output.into(),
        }
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Fetch and write the stats. Any failure leaves the output untouched.
    pub async fn run(&self, github: &GithubClient) -> Result<RepoStats> {
        validate_repo(&self.repo)?;

        let stats = github.repo_stats(&self.repo).await?;
        write_json_pretty(&self.output, &stats)?;

        tracing::info!(
            repo = %self.repo,
            stars = stats.stars,
            forks = stats.forks,
            issues = ?stats.issues,
            path = %self.output.display(),
            "Wrote GitHub stats"
        );
        Ok(stats)
    }
}
