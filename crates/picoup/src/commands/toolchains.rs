//! `picoup toolchains`

use std::fmt::Write as _;

use picoup_core::{HostEnvironment, PlatformKey, ToolchainIndex};

use super::build_index_loader;
use crate::cli::CliError;
use crate::config::Settings;

/// List the versions in `index` that have a build for `env`.
#[must_use]
pub fn render(index: &ToolchainIndex, env: HostEnvironment) -> String {
    let key = PlatformKey::from(env);
    let versions = index.versions_for(key);

    let mut out = format!("Toolchains for {env} ({key}, {} index):", index.provenance);
    if versions.is_empty() {
        out.push_str("\n  (none)");
    }
    for version in versions {
        let _ = write!(out, "\n  {version}");
    }
    out
}

/// Load the index and list versions for the detected host.
///
/// # Errors
///
/// Fails on unsupported hosts or when no index source is usable.
pub async fn execute(settings: &Settings) -> Result<String, CliError> {
    let env = HostEnvironment::detect()?;
    let index = build_index_loader(settings)?.load().await?;
    Ok(render(&index, env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use picoup_core::{Arch, Os, Provenance};

    #[test]
    fn test_render_filters_by_host() {
        let index = ToolchainIndex::parse(
            "[13_3_Rel1]\nlinux_x64 = a\n[14_2_Rel1]\nlinux_x64 = b\ndarwin_arm64 = c\n",
            Provenance::BundledFallback,
        );

        let linux = render(&index, HostEnvironment::new(Os::Linux, Arch::X86_64));
        assert_eq!(
            linux,
            "Toolchains for linux/x86_64 (linux_x64, bundled fallback index):\n  13_3_Rel1\n  14_2_Rel1"
        );

        let mac = render(&index, HostEnvironment::new(Os::MacOs, Arch::Aarch64));
        assert!(mac.ends_with(":\n  14_2_Rel1"));

        let arm = render(&index, HostEnvironment::new(Os::Linux, Arch::Aarch64));
        assert!(arm.ends_with("(none)"));
    }
}
