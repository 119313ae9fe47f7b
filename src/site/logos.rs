use std::path::{Path, PathBuf};

use crate::error::{ErrorCode, FetchError, Result};
use crate::github::{AvatarSource, GithubClient};
use crate::utils::write_atomic;

pub const DEFAULT_LOGO_DIR: &str = "static/img/tech-logos";

/// One logo to cache, saved as `<slug>.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoTarget {
    pub slug: String,
    pub source: AvatarSource,
}

impl LogoTarget {
    pub fn repo(slug: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            source: AvatarSource::Repo(repo.into()),
        }
    }

    pub fn org(slug: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            source: AvatarSource::Org(org.into()),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self.slug)
    }
}

/// The technologies shown on the landing page.
pub fn default_targets() -> Vec<LogoTarget> {
    vec![
        LogoTarget::repo("theepicsaxguy", "theepicsaxguy/homelab"),
        LogoTarget::repo("kubernetes", "kubernetes/kubernetes"),
        LogoTarget::repo("talos", "siderolabs/talos"),
        LogoTarget::repo("argocd", "argoproj/argo-cd"),
        LogoTarget::repo("opentofu", "opentofu/opentofu"),
        LogoTarget::repo("prometheus", "prometheus/prometheus"),
        LogoTarget::repo("grafana", "grafana/grafana"),
        // Proxmox has no repository on GitHub, only an organization
        LogoTarget::org("proxmox", "proxmox"),
    ]
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogoReport {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    /// Slug and reason.
    pub failed: Vec<(String, String)>,
}

impl LogoReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Downloads each target's avatar unless it is already on disk.
#[derive(Debug, Clone)]
pub struct LogoJob {
    dir: PathBuf,
    targets: Vec<LogoTarget>,
}

impl Default for LogoJob {
    fn default() -> Self {
        Self::new(DEFAULT_LOGO_DIR, default_targets())
    }
}

impl LogoJob {
    pub fn new(dir: impl Into<PathBuf>, targets: Vec<LogoTarget>) -> Self {
        Self {
            dir: dir.into(),
            targets,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn targets(&self) -> &[LogoTarget] {
        &self.targets
    }

    /// Walk the targets in order.
    ///
    /// A target that fails is recorded in the report and the loop moves on;
    /// only a directory that cannot be created is an error.
    pub async fn run(&self, github: &GithubClient) -> Result<LogoReport> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            FetchError::io_error(
                ErrorCode::IoWriteError,
                format!("Failed to create directory {}", self.dir.display()),
                e,
            )
        })?;

        let mut report = LogoReport::default();

        for target in &self.targets {
            if !is_safe_slug(&target.slug) {
                tracing::warn!("Skipping logo with unusable slug {:?}", target.slug);
                report
                    .failed
                    .push((target.slug.clone(), "invalid slug".to_string()));
                continue;
            }

            let path = self.dir.join(target.file_name());
            if path.exists() {
                tracing::info!("Logo for {} already exists. Skipping download.", target.slug);
                report.skipped.push(target.slug.clone());
                continue;
            }

            match download_logo(github, target, &path).await {
                Ok(bytes) => {
                    tracing::info!("Downloaded {} ({} bytes)", target.file_name(), bytes);
                    report.downloaded.push(target.slug.clone());
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch logo for {}: {}", target.slug, e);
                    report.failed.push((target.slug.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Logo fetch finished"
        );
        Ok(report)
    }
}

async fn download_logo(github: &GithubClient, target: &LogoTarget, path: &Path) -> Result<usize> {
    let avatar_url = github.avatar_url(&target.source).await?;
    let image = github.download(&avatar_url).await?;

    if image.is_empty() {
        return Err(FetchError::new(
            ErrorCode::HttpEmptyBody,
            format!("Empty image body from {}", avatar_url),
        ));
    }

    write_atomic(path, &image.body)?;
    Ok(image.body.len())
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
