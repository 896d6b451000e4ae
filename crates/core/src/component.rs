//! Component identifiers and the caller-supplied install request.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One independently installable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentId {
    /// The Pico SDK, installed by source-control clone.
    Sdk,
    /// The ARM cross compiler.
    Toolchain,
    /// Optional prebuilt SDK tools bundle.
    Tools,
    /// Ninja build tool.
    Ninja,
    /// CMake build generator.
    Cmake,
    /// Device flashing utility.
    Picotool,
    /// Debug-probe server.
    Openocd,
}

impl ComponentId {
    /// Every component in resolution and rendering order.
    pub const ALL: [Self; 7] = [
        Self::Sdk,
        Self::Toolchain,
        Self::Tools,
        Self::Ninja,
        Self::Cmake,
        Self::Picotool,
        Self::Openocd,
    ];

    /// Stable string tag used in install paths and manifest keys.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::Toolchain => "toolchain",
            Self::Tools => "tools",
            Self::Ninja => "ninja",
            Self::Cmake => "cmake",
            Self::Picotool => "picotool",
            Self::Openocd => "openocd",
        }
    }

    /// Whether a miss for this component aborts the whole resolve.
    #[must_use]
    pub fn is_required(self) -> bool {
        !matches!(self, Self::Tools)
    }

    /// Parse from a stable tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.tag() == s)
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Versions requested by the caller, one per component.
///
/// Version strings are free-form and component specific: the toolchain uses
/// underscores (`14_2_Rel1`), everything else is dotted. No defaults are
/// invented here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub sdk: String,
    pub toolchain: String,
    pub cmake: String,
    pub ninja: String,
    pub picotool: String,
    pub openocd: String,
    /// Whether to resolve the optional tools bundle.
    pub include_tools: bool,
}

impl InstallRequest {
    /// Requested version for a component. The tools bundle follows the SDK.
    #[must_use]
    pub fn version_of(&self, id: ComponentId) -> &str {
        match id {
            ComponentId::Sdk | ComponentId::Tools => &self.sdk,
            ComponentId::Toolchain => &self.toolchain,
            ComponentId::Ninja => &self.ninja,
            ComponentId::Cmake => &self.cmake,
            ComponentId::Picotool => &self.picotool,
            ComponentId::Openocd => &self.openocd,
        }
    }

    /// Reject blank versions for required components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] naming the first blank component.
    pub fn validate(&self) -> Result<()> {
        for id in ComponentId::ALL.into_iter().filter(|id| id.is_required()) {
            if self.version_of(id).trim().is_empty() {
                return Err(Error::invalid_request(format!(
                    "missing version for required component '{id}'"
                )));
            }
        }
        Ok(())
    }
}
