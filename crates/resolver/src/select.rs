//! Per-component asset selection.
//!
//! Each component hardcodes its own naming conventions: extension allow-list,
//! version prefix, OS token synonyms and architecture token synonyms. The
//! predicates are pure functions of `(file name, host, version)`.
//!
//! When several assets match, the first in the release's listing order wins.
//! Order is a tie-break, not a quality signal; there is no scoring.

use picoup_core::{Arch, ComponentId, HostEnvironment, Os, Release, ReleaseAsset};
use tracing::debug;

const X86_64_TOKENS: &[&str] = &["x86_64", "x64", "amd64"];
const AARCH64_TOKENS: &[&str] = &["aarch64", "arm64"];
const MAC_TOKENS: &[&str] = &["mac", "macos", "darwin", "osx"];

/// Extensions published by the pico-sdk-tools repository.
const SDK_TOOLS_EXTENSIONS: &[&str] = &[".tar.gz", ".zip", ".tar.xz"];

fn arch_tokens(arch: Arch) -> &'static [&'static str] {
    match arch {
        Arch::X86_64 => X86_64_TOKENS,
        Arch::Aarch64 => AARCH64_TOKENS,
    }
}

fn is_arch_token(token: &str) -> bool {
    X86_64_TOKENS.contains(&token) || AARCH64_TOKENS.contains(&token)
}

fn strip_extension<'a>(name: &'a str, allowed: &[&str]) -> Option<&'a str> {
    allowed.iter().find_map(|ext| name.strip_suffix(ext))
}

/// Product name of an asset hosted in the pico-sdk-tools repository.
fn sdk_tools_product(id: ComponentId) -> Option<&'static str> {
    match id {
        ComponentId::Tools => Some("pico-sdk-tools"),
        ComponentId::Picotool => Some("picotool"),
        ComponentId::Openocd => Some("openocd"),
        _ => None,
    }
}

/// `<product>-<version>-<arch>-<os>.<ext>`; macOS archives may be universal
/// and omit the arch token. Every trailing token must be a recognised OS or
/// arch token, so `picotool-2.2.0` never matches `picotool-2.2.0-a4-...`.
fn matches_sdk_tools(product: &str, name: &str, env: HostEnvironment, version: &str) -> bool {
    let Some(stem) = strip_extension(name, SDK_TOOLS_EXTENSIONS) else {
        return false;
    };
    let Some(rest) = stem.strip_prefix(&format!("{product}-{version}-")) else {
        return false;
    };

    let os_tokens: &[&str] = match env.os {
        Os::Linux => &["lin", "linux"],
        Os::MacOs => MAC_TOKENS,
    };

    let mut os_seen = false;
    let mut arch_seen = false;
    let mut arch_ok = false;
    for token in rest.split('-') {
        if os_tokens.contains(&token) {
            os_seen = true;
        } else if token == "universal" && env.os == Os::MacOs {
            arch_seen = true;
            arch_ok = true;
        } else if is_arch_token(token) {
            arch_seen = true;
            arch_ok |= arch_tokens(env.arch).contains(&token);
        } else {
            return false;
        }
    }

    let arch_ok = if arch_seen {
        arch_ok
    } else {
        env.os == Os::MacOs
    };
    os_seen && arch_ok
}

/// `cmake-<version>-<os>-<arch>.tar.gz`. The version prefix is case
/// sensitive; OS and arch tokens are not (older releases use `Linux`/`Darwin`).
/// macOS ships one universal archive, so the arch token is ignored there.
fn matches_cmake(name: &str, env: HostEnvironment, version: &str) -> bool {
    let Some(stem) = strip_extension(name, &[".tar.gz"]) else {
        return false;
    };
    let Some(rest) = stem.strip_prefix(&format!("cmake-{version}-")) else {
        return false;
    };
    let tokens: Vec<String> = rest.split('-').map(str::to_lowercase).collect();
    let [os, arch] = tokens.as_slice() else {
        return false;
    };

    match env.os {
        Os::Linux => os == "linux" && arch_tokens(env.arch).contains(&arch.as_str()),
        Os::MacOs => ["macos", "darwin", "osx"].contains(&os.as_str()),
    }
}

/// How a ninja asset relates to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NinjaFit {
    /// Names the host's architecture explicitly.
    ArchSpecific,
    /// Carries no architecture token.
    Generic,
}

/// `ninja-<os>[-<arch>].zip`. Names are not versioned.
fn ninja_fit(name: &str, env: HostEnvironment) -> Option<NinjaFit> {
    let stem = strip_extension(name, &[".zip"])?;
    let rest = stem.strip_prefix("ninja-")?;
    let mut tokens = rest.split('-');
    let os = tokens.next()?;
    let arch = tokens.next();
    if tokens.next().is_some() {
        return None;
    }

    let os_ok = match env.os {
        Os::Linux => os == "linux",
        Os::MacOs => MAC_TOKENS.contains(&os),
    };
    if !os_ok {
        return None;
    }

    match arch {
        None => Some(NinjaFit::Generic),
        Some(token) if arch_tokens(env.arch).contains(&token) => Some(NinjaFit::ArchSpecific),
        Some(_) => None,
    }
}

/// Linux historically ships one generic ninja for every architecture. A
/// non-x86_64 host prefers an arch-specific build when the release has one and
/// falls back to the generic name otherwise; x86_64 and macOS hosts take the
/// generic name first.
fn select_ninja(release: &Release, env: HostEnvironment) -> Option<&ReleaseAsset> {
    for asset in &release.assets {
        if ninja_fit(&asset.name, env).is_none() {
            debug!(component = "ninja", asset = %asset.name, %env, "Rejected asset");
        }
    }
    let first_with = |fit: NinjaFit| {
        release
            .assets
            .iter()
            .find(|asset| ninja_fit(&asset.name, env) == Some(fit))
    };

    let prefer_specific = env.os == Os::Linux && env.arch != Arch::X86_64;
    if prefer_specific {
        first_with(NinjaFit::ArchSpecific).or_else(|| first_with(NinjaFit::Generic))
    } else {
        first_with(NinjaFit::Generic).or_else(|| first_with(NinjaFit::ArchSpecific))
    }
}

/// Whether an asset file name is acceptable for a component on a host.
///
/// Components without release assets (the SDK and the toolchain) never match.
#[must_use]
pub fn asset_matches(id: ComponentId, name: &str, env: HostEnvironment, version: &str) -> bool {
    match id {
        ComponentId::Sdk | ComponentId::Toolchain => false,
        ComponentId::Tools | ComponentId::Picotool | ComponentId::Openocd => {
            sdk_tools_product(id).is_some_and(|product| matches_sdk_tools(product, name, env, version))
        }
        ComponentId::Cmake => matches_cmake(name, env, version),
        ComponentId::Ninja => ninja_fit(name, env).is_some(),
    }
}

/// Select the asset for a component from a release.
///
/// Returns `None` when no asset satisfies the component's rules; the caller
/// decides whether that is a skip or a failure.
#[must_use]
pub fn select_asset<'a>(
    id: ComponentId,
    release: &'a Release,
    env: HostEnvironment,
    version: &str,
) -> Option<&'a ReleaseAsset> {
    if id == ComponentId::Ninja {
        return select_ninja(release, env);
    }
    release.assets.iter().find(|asset| {
        let matched = asset_matches(id, &asset.name, env, version);
        if !matched {
            debug!(component = %id, asset = %asset.name, %env, %version, "Rejected asset");
        }
        matched
    })
}
