//! Settings: CLI flags and environment over the settings file over defaults.

use std::path::{Path, PathBuf};

use picoup_tools_github::DEFAULT_API_BASE;
use picoup_tools_index::{DEFAULT_DATA_VERSION, default_index_url};
use serde::Deserialize;
use tracing::debug;

use crate::cli::{CliError, GlobalArgs};

/// Default install root under the home directory.
pub const DEFAULT_ROOT_DIR: &str = ".pico-sdk";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub root: Option<PathBuf>,
    pub prefer_installed: Option<bool>,
    pub index_url: Option<String>,
    pub index_data_version: Option<String>,
    pub api_base: Option<String>,
    pub resources_dir: Option<PathBuf>,
}

impl FileSettings {
    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("picoup").join("config.toml"))
    }

    /// Parse settings text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming `origin` on invalid TOML or
    /// unknown keys.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| {
            CliError::config_with_help(
                format!("Invalid settings file {}: {e}", origin.display()),
                "Known keys: root, prefer_installed, index_url, index_data_version, api_base, resources_dir",
            )
        })
    }

    /// Load from an explicit path, or from the default path if it exists.
    ///
    /// # Errors
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded settings file");
                Self::parse(&text, &path)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CliError::config(format!(
                "Cannot read settings file {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root: PathBuf,
    pub github_token: Option<String>,
    pub prefer_installed: bool,
    /// `None` when the remote index is skipped.
    pub index_url: Option<String>,
    pub api_base: String,
    pub resources_dir: Option<PathBuf>,
}

impl Settings {
    /// Merge flags over file settings over defaults.
    ///
    /// `fallback_token` is consulted only when no token was given by flag or
    /// `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no install root can be determined.
    pub fn resolve(
        args: &GlobalArgs,
        file: FileSettings,
        fallback_token: Option<String>,
    ) -> Result<Self, CliError> {
        let root = match args.root.clone().or(file.root) {
            Some(root) => root,
            None => dirs::home_dir()
                .map(|home| home.join(DEFAULT_ROOT_DIR))
                .ok_or_else(|| {
                    CliError::config_with_help(
                        "Cannot determine the home directory",
                        "Pass --root or set PICOUP_ROOT",
                    )
                })?,
        };

        let index_url = if args.offline_index {
            None
        } else {
            Some(file.index_url.unwrap_or_else(|| {
                default_index_url(
                    file.index_data_version
                        .as_deref()
                        .unwrap_or(DEFAULT_DATA_VERSION),
                )
            }))
        };

        Ok(Self {
            root,
            github_token: args
                .github_token
                .clone()
                .or(fallback_token)
                .filter(|t| !t.is_empty()),
            prefer_installed: args.prefer_installed || file.prefer_installed.unwrap_or(false),
            index_url,
            api_base: file
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            resources_dir: file.resources_dir,
        })
    }

    /// Load the settings file named by `args` (or the default one) and merge.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unreadable or invalid settings.
    pub fn load(args: &GlobalArgs) -> Result<Self, CliError> {
        let file = FileSettings::load(args.config.as_deref())?;
        Self::resolve(args, file, std::env::var("GH_TOKEN").ok())
    }
}
