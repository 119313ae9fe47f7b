//! Typed access to the handful of GitHub REST endpoints the site uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorCode, FetchError, Result};
use crate::http::ResilientFetcher;
use crate::types::FetchedResource;

/// Star, fork and open-issue counts as written for the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStats {
    pub stars: u64,
    pub forks: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: Option<String>,
    pub avatar_url: String,
}

/// The subset of `GET /repos/{owner}/{repo}` we read.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub stargazers_count: u64,
    pub forks_count: u64,
    #[serde(default)]
    pub owner: Option<Owner>,
}

impl Repository {
    pub fn stats(&self) -> RepoStats {
        RepoStats {
            stars: self.stargazers_count,
            forks: self.forks_count,
            issues: None,
        }
    }
}

/// The subset of `GET /orgs/{org}` we read.
#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub login: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueSearch {
    pub total_count: u64,
}

/// Where an avatar comes from: a repository's owner or an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    Repo(String),
    Org(String),
}

impl fmt::Display for AvatarSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarSource::Repo(repo) => write!(f, "repo {}", repo),
            AvatarSource::Org(org) => write!(f, "org {}", org),
        }
    }
}

/// Check that `repo` looks like `owner/name`.
pub fn validate_repo(repo: &str) -> Result<()> {
    let mut parts = repo.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if is_name(owner) && is_name(name) => Ok(()),
        _ => Err(FetchError::config_error(
            ErrorCode::ConfigInvalidRepository,
            format!("Repository must be 'owner/name', got '{}'", repo),
        )),
    }
}

fn is_name(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub struct GithubClient {
    fetcher: Arc<ResilientFetcher>,
    api_base_url: String,
}

impl GithubClient {
    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        let api_base_url = fetcher.options().api_base_url.trim_end_matches('/').to_string();
        Self {
            fetcher,
            api_base_url,
        }
    }

    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    pub fn repository_url(&self, repo: &str) -> String {
        format!("{}/repos/{}", self.api_base_url, repo)
    }

    pub fn organization_url(&self, org: &str) -> String {
        format!("{}/orgs/{}", self.api_base_url, org)
    }

    pub fn issue_search_url(&self, repo: &str) -> String {
        format!(
            "{}/search/issues?q=repo:{}+is:issue+is:open",
            self.api_base_url, repo
        )
    }

    pub async fn repository(&self, repo: &str) -> Result<Repository> {
        validate_repo(repo)?;
        let request = self.fetcher.request(self.repository_url(repo))?;
        self.fetcher.fetch_json(&request).await
    }

    pub async fn organization(&self, org: &str) -> Result<Organization> {
        if !is_name(org) {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidRepository,
                format!("Invalid organization name '{}'", org),
            ));
        }
        let request = self.fetcher.request(self.organization_url(org))?;
        self.fetcher.fetch_json(&request).await
    }

    pub async fn open_issue_count(&self, repo: &str) -> Result<u64> {
        validate_repo(repo)?;
        let request = self.fetcher.request(self.issue_search_url(repo))?;
        let search: IssueSearch = self.fetcher.fetch_json(&request).await?;
        Ok(search.total_count)
    }

    /// Repository counts plus the open issue count, fetched concurrently.
    ///
    /// The repository is required. The issue count is best effort: if the
    /// search fails it is logged and left out.
    pub async fn repo_stats(&self, repo: &str) -> Result<RepoStats> {
        validate_repo(repo)?;

        let (repository, issues) =
            tokio::join!(self.repository(repo), self.open_issue_count(repo));

        let mut stats = repository?.stats();
        match issues {
            Ok(count) => stats.issues = Some(count),
            Err(e) => tracing::warn!("Open issue count for {} unavailable: {}", repo, e),
        }

        Ok(stats)
    }

    pub async fn avatar_url(&self, source: &AvatarSource) -> Result<String> {
        let avatar = match source {
            AvatarSource::Repo(repo) => self.repository(repo).await?.owner.map(|o| o.avatar_url),
            AvatarSource::Org(org) => self.organization(org).await?.avatar_url,
        };

        avatar.filter(|url| !url.is_empty()).ok_or_else(|| {
            FetchError::new(
                ErrorCode::HttpInvalidResponse,
                format!("No avatar URL found for {}", source),
            )
        })
    }

    /// Download raw bytes, e.g. an avatar image.
    pub async fn download(&self, url: &str) -> Result<FetchedResource> {
        let request = self.fetcher.request(url)?;
        self.fetcher.fetch(&request).await.into_result()
    }
}
