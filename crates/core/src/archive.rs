//! Archive type inference from download URLs.

use serde::{Deserialize, Serialize};

/// Container format of a downloadable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveType {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.xz")]
    TarXz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
    #[serde(rename = "pkg")]
    Pkg,
    #[serde(rename = "unknown")]
    Unknown,
}

// Most specific suffix first.
const SUFFIXES: &[(&str, ArchiveType)] = &[
    (".tar.xz", ArchiveType::TarXz),
    (".tar.gz", ArchiveType::TarGz),
    (".tar.bz2", ArchiveType::TarBz2),
    (".txz", ArchiveType::TarXz),
    (".tgz", ArchiveType::TarGz),
    (".tbz2", ArchiveType::TarBz2),
    (".pkg", ArchiveType::Pkg),
    (".zip", ArchiveType::Zip),
];

impl ArchiveType {
    /// Classify a URL or file name by suffix, case-insensitively.
    ///
    /// Query strings and fragments are ignored.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map_or(Self::Unknown, |(_, kind)| *kind)
    }

    /// Short tag, e.g. `tar.gz`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarBz2 => "tar.bz2",
            Self::Pkg => "pkg",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
