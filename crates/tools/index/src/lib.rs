//! Toolchain index loader for picoup.
//!
//! Loads `supportedToolchains.ini` with exactly one remote attempt followed by
//! exactly one pass over the bundled fallback locations. This is an ordered
//! two-step strategy, not a retry loop and not a cache: the remote endpoint is
//! never contacted twice.
//!
//! The chosen [`Provenance`] is recorded on the returned index so callers can
//! tell which source supplied a URL.

use std::path::PathBuf;

use async_trait::async_trait;
use picoup_core::{Error, IndexSource, Provenance, Result, ToolchainIndex};
use reqwest::Client;
use tracing::{debug, info, warn};

/// File name of the index, both remotely and on disk.
pub const INDEX_FILE_NAME: &str = "supportedToolchains.ini";

/// Version of the hosted data directory the remote index is read from.
pub const DEFAULT_DATA_VERSION: &str = "0.17.3";

/// Copy of the index compiled into the binary.
pub const BUNDLED_INDEX: &str = include_str!("../data/supportedToolchains.ini");

/// URL of the hosted index for a data version.
#[must_use]
pub fn default_index_url(data_version: &str) -> String {
    format!(
        "https://raw.githubusercontent.com/raspberrypi/pico-vscode/main/data/{data_version}/{INDEX_FILE_NAME}"
    )
}

/// One place the bundled index may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackLocation {
    /// The copy packaged into the binary.
    Embedded,
    /// A file on disk.
    File(PathBuf),
}

impl FallbackLocation {
    fn describe(&self) -> String {
        match self {
            Self::Embedded => "embedded resource".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> std::result::Result<String, String> {
        match self {
            Self::Embedded => Ok(BUNDLED_INDEX.to_string()),
            Self::File(path) => std::fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string())),
        }
    }
}

/// Fallback locations in lookup order: an explicit resources directory, the
/// packaged copy, the executable's directory, then a sibling `Resources`
/// directory.
#[must_use]
pub fn default_fallbacks(resources_dir: Option<PathBuf>) -> Vec<FallbackLocation> {
    let mut locations = Vec::new();
    if let Some(dir) = resources_dir {
        locations.push(FallbackLocation::File(dir.join(INDEX_FILE_NAME)));
    }
    locations.push(FallbackLocation::Embedded);
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    {
        locations.push(FallbackLocation::File(exe_dir.join(INDEX_FILE_NAME)));
        locations.push(FallbackLocation::File(
            exe_dir.join("..").join("Resources").join(INDEX_FILE_NAME),
        ));
    }
    locations
}

/// Remote-then-bundled toolchain index loader.
#[derive(Debug, Clone)]
pub struct IndexLoader {
    client: Client,
    remote_url: Option<String>,
    fallbacks: Vec<FallbackLocation>,
}

impl IndexLoader {
    /// Create a loader for the default remote URL and fallback locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let remote_url = default_index_url(DEFAULT_DATA_VERSION);
        let client = Client::builder()
            .user_agent(picoup_core::USER_AGENT)
            .build()
            .map_err(|e| Error::transport(&remote_url, format!("client setup: {e}")))?;
        Ok(Self {
            client,
            remote_url: Some(remote_url),
            fallbacks: default_fallbacks(None),
        })
    }

    /// Set the remote URL; `None` skips the remote attempt entirely.
    #[must_use]
    pub fn with_remote_url(mut self, url: Option<String>) -> Self {
        self.remote_url = url;
        self
    }

    /// Replace the fallback locations.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: Vec<FallbackLocation>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Configured fallback locations.
    #[must_use]
    pub fn fallbacks(&self) -> &[FallbackLocation] {
        &self.fallbacks
    }

    async fn fetch_remote(&self, url: &str) -> Result<ToolchainIndex> {
        debug!(%url, "Fetching toolchain index");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(url, format!("reading body: {e}")))?;
        if !status.is_success() {
            return Err(Error::http(
                url,
                status.as_u16(),
                String::from_utf8_lossy(&bytes),
            ));
        }
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::transport(url, format!("body is not UTF-8: {e}")))?;
        let index = ToolchainIndex::parse(&text, Provenance::Remote);
        if index.is_empty() {
            return Err(Error::transport(url, "index contains no sections"));
        }
        Ok(index)
    }

    fn load_fallback(&self, attempted: &mut Vec<String>) -> Option<ToolchainIndex> {
        for location in &self.fallbacks {
            attempted.push(location.describe());
            match location.read() {
                Ok(text) => {
                    let index = ToolchainIndex::parse(&text, Provenance::BundledFallback);
                    if index.is_empty() {
                        debug!(location = %location.describe(), "Bundled index has no sections");
                        continue;
                    }
                    info!(location = %location.describe(), "Using bundled toolchain index");
                    return Some(index);
                }
                Err(e) => {
                    debug!(location = %location.describe(), error = %e, "Bundled index unreadable");
                }
            }
        }
        None
    }

    /// Load the index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexUnavailable`] when the remote attempt and every
    /// fallback location fail.
    pub async fn load(&self) -> Result<ToolchainIndex> {
        let mut attempted = Vec::new();

        if let Some(url) = &self.remote_url {
            attempted.push(url.clone());
            match self.fetch_remote(url).await {
                Ok(index) => {
                    info!(%url, versions = index.sections.len(), "Loaded remote toolchain index");
                    return Ok(index);
                }
                Err(e) => {
                    warn!(error = %e, "Remote toolchain index unavailable, using bundled copy");
                }
            }
        }

        self.load_fallback(&mut attempted)
            .ok_or(Error::IndexUnavailable { attempted })
    }
}

#[async_trait]
impl IndexSource for IndexLoader {
    async fn load_index(&self) -> Result<ToolchainIndex> {
        self.load().await
    }
}
