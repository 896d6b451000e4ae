//! Version and asset resolution for picoup.
//!
//! Turns an [`InstallRequest`](picoup_core::InstallRequest) plus a host into an
//! [`InstallPlan`](picoup_core::InstallPlan) by consulting the toolchain index
//! and hosted release metadata. Nothing is downloaded here.

mod probe;
mod resolver;
mod select;
mod upstream;

pub use probe::{FsProbe, InstallProbe};
pub use resolver::{DEFAULT_TOOLS_RELEASE_LIMIT, VersionResolver};
pub use select::{asset_matches, select_asset};
pub use upstream::{
    CMAKE_REPO, GUESSED_TAG_SUFFIX, NINJA_REPO, OPENOCD_RELEASE_TAGS, PICO_SDK_CLONE_URL,
    PICOTOOL_RELEASE_TAGS, SDK_TOOLS_REPO, TagLookup, install_path, sdk_tools_release_tag, v_tag,
};
