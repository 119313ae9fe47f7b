//! Build-time jobs that feed the documentation site.
//!
//! ```text
//! fetch-github-stats ─▶ StatsJob ─▶ GithubClient::repo_stats ─▶ src/data/github-stats.json
//! fetch-tech-logos   ─▶ LogoJob  ─▶ GithubClient::avatar_url ─▶ static/img/tech-logos/<slug>.png
//! ```

mod logos;
mod stats;

pub use logos::{default_targets, LogoJob, LogoReport, LogoTarget, DEFAULT_LOGO_DIR};
pub use stats::{StatsJob, DEFAULT_REPO, DEFAULT_STATS_PATH};
