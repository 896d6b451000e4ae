//! Upstream locations, release-tag conventions and install paths.

use picoup_core::{ComponentId, Repository};

/// Source repository cloned for the SDK.
pub const PICO_SDK_CLONE_URL: &str = "https://github.com/raspberrypi/pico-sdk.git";

/// Hosts the tools bundle, picotool and openocd as assets of shared releases.
pub const SDK_TOOLS_REPO: Repository = Repository::new("raspberrypi", "pico-sdk-tools");

/// CMake releases.
pub const CMAKE_REPO: Repository = Repository::new("Kitware", "CMake");

/// Ninja releases.
pub const NINJA_REPO: Repository = Repository::new("ninja-build", "ninja");

/// Suffix appended to guessed pico-sdk-tools release tags.
pub const GUESSED_TAG_SUFFIX: &str = "-0";

/// Known picotool version → pico-sdk-tools release tag.
///
/// Extension point: versions missing here get a guessed tag.
pub const PICOTOOL_RELEASE_TAGS: &[(&str, &str)] = &[
    ("2.0.0", "v2.0.0-5"),
    ("2.1.0", "v2.1.0-0"),
    ("2.1.1", "v2.1.1-1"),
    ("2.2.0", "v2.2.0-0"),
    ("2.2.0-a4", "v2.2.0-3"),
];

/// Known openocd version → pico-sdk-tools release tag.
pub const OPENOCD_RELEASE_TAGS: &[(&str, &str)] = &[("0.12.0+dev", "v2.2.0-3")];

/// `version` with a leading `v`, unless it already has one.
#[must_use]
pub fn v_tag(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// A release tag looked up for a picotool/openocd version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLookup {
    pub tag: String,
    /// True when the version was not in the table and the tag is a guess.
    pub guessed: bool,
}

/// Map a public picotool/openocd version to its pico-sdk-tools release tag.
///
/// Unmapped versions fall back to `v<version>-0`. A wrong guess surfaces
/// later as a missing tag or asset; it is not detected here.
#[must_use]
pub fn sdk_tools_release_tag(id: ComponentId, version: &str) -> TagLookup {
    let table = match id {
        ComponentId::Picotool => PICOTOOL_RELEASE_TAGS,
        ComponentId::Openocd => OPENOCD_RELEASE_TAGS,
        _ => &[],
    };
    match table.iter().find(|(v, _)| *v == version) {
        Some((_, tag)) => TagLookup {
            tag: (*tag).to_string(),
            guessed: false,
        },
        None => TagLookup {
            tag: format!("{}{GUESSED_TAG_SUFFIX}", v_tag(version)),
            guessed: true,
        },
    }
}

/// Install location of a component relative to the install root.
#[must_use]
pub fn install_path(id: ComponentId, version: &str) -> String {
    match id {
        ComponentId::Ninja | ComponentId::Cmake => format!("{}/{}", id.tag(), v_tag(version)),
        _ => format!("{}/{version}", id.tag()),
    }
}
