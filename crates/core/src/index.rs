//! Toolchain index: version → platform key → download URL.
//!
//! The index text format is a lenient INI dialect:
//!
//! ```text
//! ; comment
//! [14_2_Rel1]
//! linux_x64 = https://.../arm-gnu-toolchain-14.2.rel1-x86_64-arm-none-eabi.tar.xz
//! ```
//!
//! Malformed lines (no `=`, or before any section header) are skipped rather
//! than rejected, matching what the upstream generator emits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Arch, HostEnvironment, Os, Result};

/// Which source supplied the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    /// Fetched from the hosted resource.
    Remote,
    /// Read from a copy shipped with picoup.
    BundledFallback,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::BundledFallback => write!(f, "bundled fallback"),
        }
    }
}

/// The 4-way platform encoding used as keys inside index sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKey {
    DarwinX64,
    DarwinArm64,
    LinuxX64,
    LinuxArm64,
}

impl PlatformKey {
    /// Key string as it appears in the index.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DarwinX64 => "darwin_x64",
            Self::DarwinArm64 => "darwin_arm64",
            Self::LinuxX64 => "linux_x64",
            Self::LinuxArm64 => "linux_arm64",
        }
    }
}

impl From<HostEnvironment> for PlatformKey {
    fn from(env: HostEnvironment) -> Self {
        match (env.os, env.arch) {
            (Os::MacOs, Arch::X86_64) => Self::DarwinX64,
            (Os::MacOs, Arch::Aarch64) => Self::DarwinArm64,
            (Os::Linux, Arch::X86_64) => Self::LinuxX64,
            (Os::Linux, Arch::Aarch64) => Self::LinuxArm64,
        }
    }
}

impl std::fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed toolchain index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainIndex {
    /// Version → platform key → URL.
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
    pub provenance: Provenance,
}

impl ToolchainIndex {
    /// Parse index text.
    #[must_use]
    pub fn parse(text: &str, provenance: Provenance) -> Self {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some(section) = current.as_ref() else {
                continue;
            };
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.trim().to_string());
        }

        Self {
            sections,
            provenance,
        }
    }

    /// Exact lookup of a version for a platform. No fuzzing.
    #[must_use]
    pub fn url_for(&self, version: &str, key: PlatformKey) -> Option<&str> {
        self.sections
            .get(version)
            .and_then(|section| section.get(key.as_str()))
            .map(String::as_str)
    }

    /// Versions that have a URL for the given platform, in sorted order.
    #[must_use]
    pub fn versions_for(&self, key: PlatformKey) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|(_, section)| section.contains_key(key.as_str()))
            .map(|(version, _)| version.as_str())
            .collect()
    }

    /// Whether parsing produced no sections at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Supplies the toolchain index for a resolution run.
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Load the index. Called at most once per resolve.
    async fn load_index(&self) -> Result<ToolchainIndex>;
}
