//! Streaming downloads to a temporary file.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use picoup_core::{Error, Result, USER_AGENT};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Fetches asset archives.
///
/// Bytes are streamed to `<dest>.part` and renamed onto `dest` only once the
/// body is complete. A single attempt is made; there are no retries.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Create a downloader with the picoup user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::transport("<client>", e.to_string()))?;
        Ok(Self { client })
    }

    /// Use an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure or a non-success status,
    /// and [`Error::Io`] when the file cannot be written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!(%url, dest = %dest.display(), "Downloading");
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http(url, status.as_u16(), body));
        }

        let partial = partial_path(dest);
        let result = stream_to(response, url, &partial).await;
        match result {
            Ok(written) => {
                tokio::fs::rename(&partial, dest).await?;
                debug!(%url, bytes = written, "Download complete");
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

async fn stream_to(response: reqwest::Response, url: &str, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::transport(url, e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
