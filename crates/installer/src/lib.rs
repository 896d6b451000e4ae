//! Installation of resolved picoup plans.
//!
//! Takes an [`InstallPlan`](picoup_core::InstallPlan) and makes it true on disk:
//! archives are streamed to temporary files, unpacked beside their install
//! path and renamed into place; the SDK is shallow-cloned with its submodules.
//! Successful components are recorded in `picoup-manifest.json` under the
//! install root.

mod download;
mod extract;
mod git;
mod installer;
mod manifest;

pub use download::Downloader;
pub use extract::{is_supported, unpack};
pub use git::Git;
pub use installer::{InstallReport, Installer, Outcome};
pub use manifest::{MANIFEST_FILE_NAME, Manifest};
