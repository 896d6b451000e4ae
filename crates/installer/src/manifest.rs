//! Record of what has been installed under a root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use picoup_core::{ComponentId, Result};
use serde::{Deserialize, Serialize};

/// File name of the manifest inside the install root.
pub const MANIFEST_FILE_NAME: &str = "picoup-manifest.json";

/// Component tag → installed version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    components: BTreeMap<String, String>,
}

impl Manifest {
    /// Path of the manifest under `root`.
    #[must_use]
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE_NAME)
    }

    /// Load the manifest; a missing file is an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        match std::fs::read_to_string(Self::path(root)) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the manifest via a temporary file and rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, root: &Path) -> Result<()> {
        std::fs::create_dir_all(root)?;
        let path = Self::path(root);
        let tmp = root.join(format!(".{MANIFEST_FILE_NAME}.tmp"));
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Record an installed component version.
    pub fn record(&mut self, id: ComponentId, version: impl Into<String>) {
        self.components.insert(id.tag().to_string(), version.into());
    }

    /// Installed version of a component, if recorded.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&str> {
        self.components.get(id.tag()).map(String::as_str)
    }

    /// Recorded entries, sorted by component tag.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
