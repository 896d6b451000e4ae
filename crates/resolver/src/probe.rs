//! "Already installed" probing.
//!
//! The resolver only asks whether a relative install path exists. Keeping that
//! behind a trait lets the core run in tests without a real filesystem.

use std::path::PathBuf;

/// Answers whether a relative install path is already present.
pub trait InstallProbe: Send + Sync {
    /// `relative_path` is `/`-separated and relative to the install root.
    fn exists(&self, relative_path: &str) -> bool;
}

impl<F> InstallProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, relative_path: &str) -> bool {
        self(relative_path)
    }
}

/// Probe backed by directories under an install root.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    /// Probe under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl InstallProbe for FsProbe {
    fn exists(&self, relative_path: &str) -> bool {
        relative_path
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
            .is_dir()
    }
}
