//! Executes an [`InstallPlan`] against an install root.

use std::path::{Path, PathBuf};

use picoup_core::{ArchiveType, ComponentId, ComponentPlan, Error, InstallPlan, Result};
use tracing::{info, warn};

use crate::download::Downloader;
use crate::extract::{self, sibling};
use crate::git::Git;
use crate::manifest::Manifest;

/// What happened to one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Downloaded and extracted, or cloned.
    Installed {
        /// Absolute install location.
        path: PathBuf,
    },
    /// Nothing to fetch; the component was already present.
    Skipped {
        /// Absolute install location.
        path: PathBuf,
    },
}

/// Per-component results of an install, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Component, version and outcome.
    pub outcomes: Vec<(ComponentId, String, Outcome)>,
}

impl InstallReport {
    /// Number of components actually installed.
    #[must_use]
    pub fn installed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, _, o)| matches!(o, Outcome::Installed { .. }))
            .count()
    }
}

/// Installs planned components under a root directory.
#[derive(Debug, Clone)]
pub struct Installer {
    root: PathBuf,
    downloader: Downloader,
    git: Git,
}

impl Installer {
    /// Create an installer for `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            downloader: Downloader::new()?,
            git: Git::default(),
        })
    }

    /// Replace the downloader.
    #[must_use]
    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Replace the git runner.
    #[must_use]
    pub fn with_git(mut self, git: Git) -> Self {
        self.git = git;
        self
    }

    /// The install root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a plan's `/`-separated install path.
    #[must_use]
    pub fn destination(&self, install_path: &str) -> PathBuf {
        install_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Install every component of `plan` in render order.
    ///
    /// The plan is validated first, so nothing is touched when any install
    /// path would leave the root. Stops at the first failure. Components
    /// installed before the failure stay installed and recorded in the
    /// manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPlan`] for an unsafe plan, otherwise the first
    /// component failure.
    pub async fn install(&self, plan: &InstallPlan) -> Result<InstallReport> {
        plan.validate()?;
        let components = plan.components();
        if let Some(unsupported) = components.iter().find_map(|c| {
            let kind = archive_kind(c)?;
            (!extract::is_supported(kind)).then(|| (kind, c.download_url.clone().unwrap_or_default()))
        }) {
            return Err(Error::unsupported_archive(unsupported.0.as_str(), unsupported.1));
        }

        let mut manifest = Manifest::load(&self.root)?;
        let mut report = InstallReport::default();

        for component in components {
            let dest = self.destination(&component.install_path);
            if !component.needs_install() {
                info!(component = %component.id, path = %dest.display(), "Skipping, already installed");
                report.outcomes.push((
                    component.id,
                    component.version.clone(),
                    Outcome::Skipped { path: dest },
                ));
                continue;
            }

            self.install_component(component, &dest).await?;
            manifest.record(component.id, component.version.clone());
            manifest.save(&self.root)?;
            report.outcomes.push((
                component.id,
                component.version.clone(),
                Outcome::Installed { path: dest },
            ));
        }

        Ok(report)
    }

    async fn install_component(&self, component: &ComponentPlan, dest: &Path) -> Result<()> {
        if let Some(url) = component.download_url.as_deref() {
            let kind = archive_kind(component).unwrap_or(ArchiveType::Unknown);
            let archive = sibling(dest, &format!("download.{}", kind.as_str()));
            self.downloader.download(url, &archive).await?;

            let (archive_path, dest_path) = (archive.clone(), dest.to_path_buf());
            let unpacked = tokio::task::spawn_blocking(move || {
                extract::unpack(&archive_path, kind, &dest_path)
            })
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)));

            if let Err(e) = tokio::fs::remove_file(&archive).await {
                warn!(path = %archive.display(), error = %e, "Could not remove downloaded archive");
            }
            unpacked??;
            info!(component = %component.id, version = %component.version, path = %dest.display(), "Installed");
        } else if let Some(url) = component.clone_url.as_deref() {
            self.git.clone_at_tag(url, &component.version, dest).await?;
            info!(component = %component.id, version = %component.version, path = %dest.display(), "Cloned");
        }
        Ok(())
    }
}

fn archive_kind(component: &ComponentPlan) -> Option<ArchiveType> {
    let url = component.download_url.as_deref()?;
    Some(
        component
            .archive_type
            .unwrap_or_else(|| ArchiveType::from_url(url)),
    )
}
