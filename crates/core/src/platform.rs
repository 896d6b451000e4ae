//! Host environment detection.
//!
//! Everything downstream branches on the `(Os, Arch)` pair, so the pair is a
//! closed enum and detection fails fast on anything outside it.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Operating system and CPU architecture of the machine being provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostEnvironment {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl HostEnvironment {
    /// Create a host environment from known parts.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the running host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when the OS or architecture is
    /// outside the supported set.
    pub fn detect() -> Result<Self> {
        Self::from_raw(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a host environment from raw OS and machine strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] naming the offending raw value.
    pub fn from_raw(os: &str, arch: &str) -> Result<Self> {
        let os = Os::parse(os)
            .ok_or_else(|| Error::unsupported_platform(format!("operating system '{os}'")))?;
        let arch = Arch::parse(arch)
            .ok_or_else(|| Error::unsupported_platform(format!("machine architecture '{arch}'")))?;
        Ok(Self { os, arch })
    }

    /// All four supported pairs, in a fixed order.
    #[must_use]
    pub fn all() -> [Self; 4] {
        [
            Self::new(Os::MacOs, Arch::X86_64),
            Self::new(Os::MacOs, Arch::Aarch64),
            Self::new(Os::Linux, Arch::X86_64),
            Self::new(Os::Linux, Arch::Aarch64),
        ]
    }
}

impl std::fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    MacOs,
    Linux,
}

impl Os {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
}

impl Arch {
    /// Parse from string, accepting the common aliases.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "aarch64" | "arm64" => Some(Self::Aarch64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::Aarch64 => write!(f, "aarch64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_accepts_aliases() {
        let env = HostEnvironment::from_raw("macos", "arm64").unwrap();
        assert_eq!(env, HostEnvironment::new(Os::MacOs, Arch::Aarch64));

        let env = HostEnvironment::from_raw("Linux", "amd64").unwrap();
        assert_eq!(env, HostEnvironment::new(Os::Linux, Arch::X86_64));

        let env = HostEnvironment::from_raw("darwin", "x86_64").unwrap();
        assert_eq!(env, HostEnvironment::new(Os::MacOs, Arch::X86_64));
    }

    #[test]
    fn test_from_raw_rejects_windows() {
        let err = HostEnvironment::from_raw("windows", "x86_64").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("windows"));
    }

    #[test]
    fn test_from_raw_names_raw_arch() {
        let err = HostEnvironment::from_raw("linux", "riscv64").unwrap_err();
        assert!(err.to_string().contains("riscv64"));
    }

    #[test]
    fn test_display() {
        let env = HostEnvironment::new(Os::Linux, Arch::Aarch64);
        assert_eq!(env.to_string(), "linux/aarch64");
    }

    #[test]
    fn test_serde_tags() {
        let env = HostEnvironment::new(Os::MacOs, Arch::X86_64);
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"{"os":"macos","arch":"x86_64"}"#);
        let back: HostEnvironment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_detect_is_deterministic() {
        // CI hosts are all supported pairs; either way detect must not flip-flop.
        let a = HostEnvironment::detect().map_err(|e| e.to_string());
        let b = HostEnvironment::detect().map_err(|e| e.to_string());
        assert_eq!(a, b);
    }
}
