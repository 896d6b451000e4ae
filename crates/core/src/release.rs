//! Upstream release metadata and the source trait that supplies it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One file attached to an upstream release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name as published.
    pub name: String,
    /// Direct download URL.
    pub download_url: String,
    /// Size in bytes, when the source reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl ReleaseAsset {
    /// Create an asset without size information.
    #[must_use]
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
            size_bytes: None,
        }
    }
}

/// A tagged upstream publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    #[serde(default)]
    pub is_prerelease: bool,
    #[serde(default)]
    pub is_draft: bool,
    /// Assets in the order the source lists them.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Create a published (non-draft, non-prerelease) release.
    #[must_use]
    pub fn new(tag: impl Into<String>, assets: Vec<ReleaseAsset>) -> Self {
        Self {
            tag: tag.into(),
            is_prerelease: false,
            is_draft: false,
            assets,
        }
    }

    /// Asset names, for diagnostics.
    #[must_use]
    pub fn asset_names(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.name.as_str()).collect()
    }
}

/// A repository on the releases host, `owner/name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Repository {
    pub owner: &'static str,
    pub name: &'static str,
}

impl Repository {
    /// Create a repository reference.
    #[must_use]
    pub const fn new(owner: &'static str, name: &'static str) -> Self {
        Self { owner, name }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Read-only access to a hosted releases API.
///
/// Implemented over HTTP by the GitHub provider and by in-memory fixtures in
/// tests. Every call is a single request; no retries.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// List releases, newest first as the host orders them.
    async fn list_releases(&self, repo: Repository, limit: usize) -> Result<Vec<Release>>;

    /// Fetch one release by tag.
    ///
    /// Fails with [`crate::Error::NotFound`] when the tag does not exist.
    async fn get_release_by_tag(&self, repo: Repository, tag: &str) -> Result<Release>;

    /// List tag names.
    async fn list_tags(&self, repo: Repository, limit: usize) -> Result<Vec<String>>;
}
