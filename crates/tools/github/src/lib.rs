//! GitHub Releases metadata client for picoup.
//!
//! Implements [`ReleaseSource`] against the GitHub REST API:
//! - `GET /repos/{owner}/{repo}/releases`
//! - `GET /repos/{owner}/{repo}/releases/tags/{tag}`
//! - `GET /repos/{owner}/{repo}/tags`
//!
//! Requests are read-only and unauthenticated unless a token is supplied, in
//! which case it is sent as a bearer token to raise the rate limit.

use async_trait::async_trait;
use picoup_core::{Error, Release, ReleaseAsset, ReleaseSource, Repository, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// The API caps `per_page` at 100.
const MAX_PER_PAGE: usize = 100;

/// GitHub release metadata from the API.
#[derive(Debug, Deserialize)]
struct WireRelease {
    tag_name: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    assets: Vec<WireAsset>,
}

/// GitHub release asset.
#[derive(Debug, Deserialize)]
struct WireAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    name: String,
}

impl From<WireRelease> for Release {
    fn from(wire: WireRelease) -> Self {
        Self {
            tag: wire.tag_name,
            is_prerelease: wire.prerelease,
            is_draft: wire.draft,
            assets: wire
                .assets
                .into_iter()
                .map(|a| ReleaseAsset {
                    name: a.name,
                    download_url: a.browser_download_url,
                    size_bytes: a.size,
                })
                .collect(),
        }
    }
}

/// Releases API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client for the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend fails to initialize.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(picoup_core::USER_AGENT)
            .build()
            .map_err(|e| Error::transport(DEFAULT_API_BASE, format!("client setup: {e}")))?;
        Ok(Self {
            client,
            base_url: DEFAULT_API_BASE.to_string(),
            token: None,
        })
    }

    /// Send this token with every request.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Point the client at a different API root (GitHub Enterprise, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether a token is configured.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, repo: Repository, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, repo.owner, repo.name, rest
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "Fetching GitHub API");

        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(url, format!("reading body: {e}")))?;

        if !status.is_success() {
            return Err(Error::http(url, status.as_u16(), body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ReleaseSource for GitHubClient {
    async fn list_releases(&self, repo: Repository, limit: usize) -> Result<Vec<Release>> {
        let url = self.repo_url(repo, &format!("releases?per_page={}", per_page(limit)));
        let releases: Vec<WireRelease> = self.get_json(&url).await?;
        debug!(%repo, count = releases.len(), "Listed releases");
        Ok(releases.into_iter().take(limit).map(Release::from).collect())
    }

    async fn get_release_by_tag(&self, repo: Repository, tag: &str) -> Result<Release> {
        let url = self.repo_url(repo, &format!("releases/tags/{tag}"));
        match self.get_json::<WireRelease>(&url).await {
            Ok(release) => Ok(release.into()),
            Err(e) if e.status() == Some(404) => Err(Error::not_found(
                repo.to_string(),
                "release tag",
                tag,
                self.base_url.clone(),
            )),
            Err(e) => Err(e),
        }
    }

    async fn list_tags(&self, repo: Repository, limit: usize) -> Result<Vec<String>> {
        let url = self.repo_url(repo, &format!("tags?per_page={}", per_page(limit)));
        let tags: Vec<WireTag> = self.get_json(&url).await?;
        Ok(tags.into_iter().take(limit).map(|t| t.name).collect())
    }
}

fn per_page(limit: usize) -> usize {
    limit.clamp(1, MAX_PER_PAGE)
}
