//! Error types shared by every picoup crate.
//!
//! Every variant carries enough context (component, version or tag, host pair)
//! to diagnose a failure without reading source. Asset naming mismatches are the
//! dominant real-world failure, so `NotFound` always names the host.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for picoup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or installing components.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Host OS or architecture is outside the supported set.
    #[error("Unsupported platform: {message}")]
    #[diagnostic(
        code(picoup::unsupported_platform),
        help("picoup supports macOS and Linux on x86_64 and aarch64 only")
    )]
    UnsupportedPlatform {
        /// Which fact was rejected and its raw value.
        message: String,
    },

    /// Non-2xx response or transport failure talking to a network endpoint.
    #[error("HTTP request to {url} failed{}: {body}", status_suffix(.status))]
    #[diagnostic(
        code(picoup::http),
        help("Set GITHUB_TOKEN to raise the API rate limit, or retry later")
    )]
    Http {
        /// Requested URL.
        url: String,
        /// Status code, absent for transport failures.
        status: Option<u16>,
        /// Response body or transport error text.
        body: String,
    },

    /// A tag, version key or matching asset could not be located.
    #[error("{component}: {what} not found for {version} on {host}")]
    #[diagnostic(code(picoup::not_found))]
    NotFound {
        /// Component tag (e.g. `cmake`).
        component: String,
        /// What was looked up (e.g. "release asset", "toolchain version").
        what: String,
        /// Version or tag attempted.
        version: String,
        /// Host description, e.g. `linux/x86_64` or a platform key.
        host: String,
    },

    /// An external process exited non-zero.
    #[error("Command `{command}` failed with {status}: {stderr}")]
    #[diagnostic(code(picoup::command_failed))]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The caller supplied an incomplete request.
    #[error("Invalid install request: {0}")]
    #[diagnostic(code(picoup::invalid_request))]
    InvalidRequest(String),

    /// A plan carries data the installer refuses to act on.
    #[error("Invalid install plan for {component}: {message}")]
    #[diagnostic(
        code(picoup::invalid_plan),
        help("Re-create the plan with `picoup resolve --json`")
    )]
    InvalidPlan {
        /// Component tag.
        component: String,
        /// What is wrong with it.
        message: String,
    },

    /// The toolchain index could not be loaded from any source.
    #[error("Toolchain index unavailable; tried: {}", .attempted.join(", "))]
    #[diagnostic(
        code(picoup::index_unavailable),
        help("Check network access or reinstall picoup so its bundled data is present")
    )]
    IndexUnavailable {
        /// Every location attempted, in order.
        attempted: Vec<String>,
    },

    /// The installer cannot unpack this archive type.
    #[error("Unsupported archive type '{archive}' for {url}")]
    #[diagnostic(code(picoup::unsupported_archive))]
    UnsupportedArchive {
        /// Archive type tag.
        archive: String,
        /// Source URL.
        url: String,
    },

    /// An archive could not be unpacked.
    #[error("Failed to extract {archive}: {message}")]
    #[diagnostic(code(picoup::extraction_failed))]
    ExtractionFailed {
        /// Archive path or URL.
        archive: String,
        /// Underlying failure.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    #[diagnostic(code(picoup::io))]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(picoup::json))]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// Create an unsupported platform error.
    #[must_use]
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            message: message.into(),
        }
    }

    /// Create an HTTP error from a status code and response body.
    #[must_use]
    pub fn http(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            status: Some(status),
            body: body.into(),
        }
    }

    /// Create an HTTP error for a transport failure.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            status: None,
            body: message.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(
        component: impl Into<String>,
        what: impl Into<String>,
        version: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            component: component.into(),
            what: what.into(),
            version: version.into(),
            host: host.into(),
        }
    }

    /// Create a command failed error.
    #[must_use]
    pub fn command_failed(
        command: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid plan error.
    #[must_use]
    pub fn invalid_plan(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported archive error.
    #[must_use]
    pub fn unsupported_archive(archive: impl Into<String>, url: impl Into<String>) -> Self {
        Self::UnsupportedArchive {
            archive: archive.into(),
            url: url.into(),
        }
    }

    /// Create an extraction failed error.
    #[must_use]
    pub fn extraction_failed(archive: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Whether this error reports a missing tag, version or asset.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status code, if this is an HTTP error with a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }
}
