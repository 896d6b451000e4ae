//! The install plan: the contract between resolution and installation.
//!
//! A plan is pure data. It serializes to a canonical JSON form (sorted keys,
//! pretty printed) and renders to text for interactive use.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ArchiveType, ComponentId, HostEnvironment, InstallRequest, Result};

/// Resolved installation data for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPlan {
    pub id: ComponentId,
    pub version: String,
    /// Install location relative to the install root, `/`-separated.
    pub install_path: String,
    /// Absent for clone-based installs and for components already on disk.
    pub download_url: Option<String>,
    pub archive_type: Option<ArchiveType>,
    /// Source-control URL for clone-based installs.
    #[serde(default)]
    pub clone_url: Option<String>,
    /// Free-text provenance for diagnostics.
    pub notes: String,
}

impl ComponentPlan {
    /// Plan a download; the archive type is inferred from the URL.
    #[must_use]
    pub fn download(
        id: ComponentId,
        version: impl Into<String>,
        install_path: impl Into<String>,
        url: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            id,
            version: version.into(),
            install_path: install_path.into(),
            archive_type: Some(ArchiveType::from_url(&url)),
            download_url: Some(url),
            clone_url: None,
            notes: notes.into(),
        }
    }

    /// Plan a source-control clone.
    #[must_use]
    pub fn clone_repo(
        id: ComponentId,
        version: impl Into<String>,
        install_path: impl Into<String>,
        clone_url: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            version: version.into(),
            install_path: install_path.into(),
            download_url: None,
            archive_type: None,
            clone_url: Some(clone_url.into()),
            notes: notes.into(),
        }
    }

    /// Plan for a component whose install path already exists.
    #[must_use]
    pub fn already_installed(
        id: ComponentId,
        version: impl Into<String>,
        install_path: impl Into<String>,
    ) -> Self {
        let install_path = install_path.into();
        Self {
            id,
            version: version.into(),
            notes: format!("already installed at {install_path}; skipped resolution"),
            install_path,
            download_url: None,
            archive_type: None,
            clone_url: None,
        }
    }

    /// Whether the installer has anything to fetch for this component.
    #[must_use]
    pub fn needs_install(&self) -> bool {
        self.download_url.is_some() || self.clone_url.is_some()
    }

    /// Check the fields the installer turns into filesystem paths and
    /// process arguments.
    ///
    /// `install_path` must be relative, non-empty and made only of normal
    /// segments. A `clone_url` must not look like a command-line option.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPlan`] naming the component.
    pub fn validate(&self) -> Result<()> {
        let reject = |message: String| Err(crate::Error::invalid_plan(self.id.tag(), message));
        let path = self.install_path.as_str();

        if path.is_empty() {
            return reject("install path is empty".into());
        }
        if path.starts_with('/') || path.contains('\\') || Path::new(path).is_absolute() {
            return reject(format!(
                "install path '{path}' must be relative and '/'-separated"
            ));
        }
        if let Some(segment) = path
            .split('/')
            .find(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return reject(format!("install path '{path}' contains a '{segment}' segment"));
        }
        match self.clone_url.as_deref() {
            Some(url) if url.is_empty() || url.starts_with('-') => {
                reject(format!("clone URL '{url}' is not a repository URL"))
            }
            _ => Ok(()),
        }
    }
}

/// Complete output of resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPlan {
    pub env: HostEnvironment,
    pub request: InstallRequest,
    pub sdk: ComponentPlan,
    pub toolchain: ComponentPlan,
    /// Present only when requested and resolvable.
    pub tools: Option<ComponentPlan>,
    pub ninja: ComponentPlan,
    pub cmake: ComponentPlan,
    pub picotool: ComponentPlan,
    pub openocd: ComponentPlan,
}

impl InstallPlan {
    /// Populated components in rendering order.
    #[must_use]
    pub fn components(&self) -> Vec<&ComponentPlan> {
        let mut out = vec![&self.sdk, &self.toolchain];
        out.extend(self.tools.as_ref());
        out.extend([&self.ninja, &self.cmake, &self.picotool, &self.openocd]);
        out
    }

    /// Look up a component by id.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&ComponentPlan> {
        match id {
            ComponentId::Sdk => Some(&self.sdk),
            ComponentId::Toolchain => Some(&self.toolchain),
            ComponentId::Tools => self.tools.as_ref(),
            ComponentId::Ninja => Some(&self.ninja),
            ComponentId::Cmake => Some(&self.cmake),
            ComponentId::Picotool => Some(&self.picotool),
            ComponentId::Openocd => Some(&self.openocd),
        }
    }

    /// Canonical JSON: keys sorted at every level, pretty printed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_canonical_json(&self) -> Result<String> {
        // serde_json's Map is a BTreeMap without `preserve_order`, so going
        // through Value sorts every object's keys.
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Validate every populated component.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::Error::InvalidPlan`] found, in render order.
    pub fn validate(&self) -> Result<()> {
        self.components().into_iter().try_for_each(ComponentPlan::validate)
    }

    /// Parse a plan previously produced by [`Self::to_canonical_json`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Human-readable rendering: host line, then one block per component.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Host: {}", self.env);
        for component in self.components() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{} {}", component.id, component.version);
            let _ = writeln!(out, "  path:    {}", component.install_path);
            let url = component
                .download_url
                .as_deref()
                .or(component.clone_url.as_deref())
                .unwrap_or("-");
            let _ = writeln!(out, "  url:     {url}");
            let archive = component
                .archive_type
                .map_or_else(|| "-".to_string(), |a| a.to_string());
            let _ = writeln!(out, "  archive: {archive}");
            let _ = writeln!(out, "  notes:   {}", component.notes);
        }
        out
    }
}

impl std::fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render_text())
    }
}
