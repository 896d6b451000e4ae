//! End-to-end resolution against in-memory release and index sources.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use picoup_core::{
    Arch, ArchiveType, ComponentId, Error, HostEnvironment, IndexSource, InstallPlan,
    InstallRequest, Os, Provenance, Release, ReleaseAsset, ReleaseSource, Repository, Result,
    ToolchainIndex,
};
use picoup_resolver::{
    CMAKE_REPO, InstallProbe, NINJA_REPO, PICO_SDK_CLONE_URL, SDK_TOOLS_REPO, VersionResolver,
    select_asset,
};
use proptest::prelude::*;

const LINUX_X64: HostEnvironment = HostEnvironment {
    os: Os::Linux,
    arch: Arch::X86_64,
};
const LINUX_ARM: HostEnvironment = HostEnvironment {
    os: Os::Linux,
    arch: Arch::Aarch64,
};
const MAC_X64: HostEnvironment = HostEnvironment {
    os: Os::MacOs,
    arch: Arch::X86_64,
};
const MAC_ARM: HostEnvironment = HostEnvironment {
    os: Os::MacOs,
    arch: Arch::Aarch64,
};

const INDEX: &str = "\
[14_2_Rel1]
darwin_arm64 = https://developer.arm.com/14.2/arm-gnu-toolchain-darwin-arm64.tar.xz
darwin_x64 = https://developer.arm.com/14.2/arm-gnu-toolchain-darwin-x86_64.tar.xz
linux_x64 = https://developer.arm.com/14.2/arm-gnu-toolchain-x86_64.tar.xz
";

/// `INDEX` plus a `linux_arm64` build, so every supported host resolves.
const FULL_INDEX: &str = "\
[14_2_Rel1]
darwin_arm64 = https://developer.arm.com/14.2/arm-gnu-toolchain-darwin-arm64.tar.xz
darwin_x64 = https://developer.arm.com/14.2/arm-gnu-toolchain-darwin-x86_64.tar.xz
linux_arm64 = https://developer.arm.com/14.2/arm-gnu-toolchain-aarch64.tar.xz
linux_x64 = https://developer.arm.com/14.2/arm-gnu-toolchain-x86_64.tar.xz
";

fn release(tag: &str, names: &[&str]) -> Release {
    Release::new(
        tag,
        names
            .iter()
            .map(|n| ReleaseAsset::new(*n, format!("https://dl.example/{tag}/{n}")))
            .collect(),
    )
}

fn sdk_tools_release() -> Release {
    release(
        "v2.2.0-3",
        &[
            "openocd-0.12.0+dev-aarch64-lin.tar.gz",
            "openocd-0.12.0+dev-mac.zip",
            "openocd-0.12.0+dev-x86_64-lin.tar.gz",
            "pico-sdk-tools-2.2.0-aarch64-lin.tar.gz",
            "pico-sdk-tools-2.2.0-mac.zip",
            "pico-sdk-tools-2.2.0-x86_64-lin.tar.gz",
            "picotool-2.2.0-a4-aarch64-lin.tar.gz",
            "picotool-2.2.0-a4-mac.zip",
            "picotool-2.2.0-a4-x86_64-lin.tar.gz",
        ],
    )
}

/// In-memory release host that counts every call.
#[derive(Default)]
struct FakeReleases {
    by_tag: HashMap<(String, String), Release>,
    listings: HashMap<String, Vec<Release>>,
    fail_listing: bool,
    calls: AtomicUsize,
}

impl FakeReleases {
    fn standard() -> Self {
        let mut fake = Self::default();
        fake.add(SDK_TOOLS_REPO, sdk_tools_release());
        fake.add(SDK_TOOLS_REPO, release("v2.1.1-1", &["pico-sdk-tools-2.1.1-x86_64-lin.tar.gz"]));
        fake.add(
            CMAKE_REPO,
            release(
                "v3.31.5",
                &[
                    "cmake-3.31.5-linux-aarch64.tar.gz",
                    "cmake-3.31.5-linux-x86_64.sh",
                    "cmake-3.31.5-linux-x86_64.tar.gz",
                    "cmake-3.31.5-macos-universal.dmg",
                    "cmake-3.31.5-macos-universal.tar.gz",
                    "cmake-3.31.5-macos10.10-universal.tar.gz",
                    "cmake-3.31.5-windows-x86_64.zip",
                ],
            ),
        );
        fake.add(
            NINJA_REPO,
            release(
                "v1.12.1",
                &["ninja-linux-aarch64.zip", "ninja-linux.zip", "ninja-mac.zip", "ninja-win.zip"],
            ),
        );
        fake
    }

    fn add(&mut self, repo: Repository, release: Release) {
        self.by_tag
            .insert((repo.to_string(), release.tag.clone()), release.clone());
        self.listings.entry(repo.to_string()).or_default().push(release);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseSource for FakeReleases {
    async fn list_releases(&self, repo: Repository, limit: usize) -> Result<Vec<Release>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Error::http(format!("fake://{repo}/releases"), 502, "bad gateway"));
        }
        let mut releases = self.listings.get(&repo.to_string()).cloned().unwrap_or_default();
        releases.truncate(limit);
        Ok(releases)
    }

    async fn get_release_by_tag(&self, repo: Repository, tag: &str) -> Result<Release> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.by_tag
            .get(&(repo.to_string(), tag.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found(repo.to_string(), "release tag", tag, "fake"))
    }

    async fn list_tags(&self, repo: Repository, _limit: usize) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .listings
            .get(&repo.to_string())
            .map(|rs| rs.iter().map(|r| r.tag.clone()).collect())
            .unwrap_or_default())
    }
}

struct FakeIndex {
    text: &'static str,
    calls: AtomicUsize,
}

impl FakeIndex {
    fn new(text: &'static str) -> Self {
        Self {
            text,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IndexSource for FakeIndex {
    async fn load_index(&self) -> Result<ToolchainIndex> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolchainIndex::parse(self.text, Provenance::Remote))
    }
}

fn request(include_tools: bool) -> InstallRequest {
    InstallRequest {
        sdk: "2.2.0".into(),
        toolchain: "14_2_Rel1".into(),
        cmake: "3.31.5".into(),
        ninja: "1.12.1".into(),
        picotool: "2.2.0-a4".into(),
        openocd: "0.12.0+dev".into(),
        include_tools,
    }
}

async fn resolve_with(
    releases: FakeReleases,
    request: &InstallRequest,
    env: HostEnvironment,
) -> Result<InstallPlan> {
    VersionResolver::new(Arc::new(releases), Arc::new(FakeIndex::new(INDEX)))
        .resolve(request, env)
        .await
}

fn url_of(plan: &InstallPlan, id: ComponentId) -> &str {
    plan.get(id)
        .and_then(|c| c.download_url.as_deref())
        .unwrap_or_default()
}

#[tokio::test]
async fn resolves_full_plan_for_linux_x64() {
    let plan = resolve_with(FakeReleases::standard(), &request(true), LINUX_X64)
        .await
        .unwrap();

    let paths: Vec<&str> = plan.components().iter().map(|c| c.install_path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "sdk/2.2.0",
            "toolchain/14_2_Rel1",
            "tools/2.2.0",
            "ninja/v1.12.1",
            "cmake/v3.31.5",
            "picotool/2.2.0-a4",
            "openocd/0.12.0+dev",
        ]
    );

    assert_eq!(plan.sdk.clone_url.as_deref(), Some(PICO_SDK_CLONE_URL));
    assert!(plan.sdk.download_url.is_none());
    assert_eq!(
        url_of(&plan, ComponentId::Toolchain),
        "https://developer.arm.com/14.2/arm-gnu-toolchain-x86_64.tar.xz"
    );
    assert_eq!(plan.toolchain.archive_type, Some(ArchiveType::TarXz));
    assert!(plan.toolchain.notes.contains("remote"));
    assert!(url_of(&plan, ComponentId::Tools).ends_with("/v2.2.0-3/pico-sdk-tools-2.2.0-x86_64-lin.tar.gz"));
    assert!(url_of(&plan, ComponentId::Ninja).ends_with("/ninja-linux.zip"));
    assert_eq!(plan.ninja.archive_type, Some(ArchiveType::Zip));
    assert!(url_of(&plan, ComponentId::Cmake).ends_with("/cmake-3.31.5-linux-x86_64.tar.gz"));
    assert_eq!(plan.cmake.archive_type, Some(ArchiveType::TarGz));
    assert!(url_of(&plan, ComponentId::Picotool).ends_with("/picotool-2.2.0-a4-x86_64-lin.tar.gz"));
    assert!(url_of(&plan, ComponentId::Openocd).ends_with("/openocd-0.12.0+dev-x86_64-lin.tar.gz"));

    let json = plan.to_canonical_json().unwrap();
    assert_eq!(InstallPlan::from_json(&json).unwrap(), plan);
}

#[tokio::test]
async fn without_tools_the_bundle_is_never_looked_up() {
    let releases = Arc::new(FakeReleases::standard());
    let resolver = VersionResolver::new(releases.clone(), Arc::new(FakeIndex::new(INDEX)));

    let plan = resolver.resolve(&request(false), LINUX_X64).await.unwrap();

    assert!(plan.tools.is_none());
    assert_eq!(plan.components().len(), 6);
    // One by-tag lookup each for ninja, cmake, picotool and openocd.
    assert_eq!(releases.calls(), 4);
}

#[tokio::test]
async fn missing_toolchain_platform_key_fails_the_whole_resolve() {
    let err = resolve_with(FakeReleases::standard(), &request(true), LINUX_ARM)
        .await
        .unwrap_err();

    match err {
        Error::NotFound {
            component,
            version,
            host,
            ..
        } => {
            assert_eq!(component, "toolchain");
            assert_eq!(version, "14_2_Rel1");
            assert!(host.contains("linux_arm64"), "host was {host}");
            assert!(host.contains("linux/aarch64"), "host was {host}");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_toolchain_version_is_not_found() {
    let mut req = request(false);
    req.toolchain = "99_9_Rel9".into();
    let err = resolve_with(FakeReleases::standard(), &req, LINUX_X64)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn tools_without_matching_asset_is_skipped() {
    let mut releases = FakeReleases::standard();
    let mut tools = sdk_tools_release();
    tools.assets.retain(|a| !a.name.starts_with("pico-sdk-tools"));
    releases
        .listings
        .insert(SDK_TOOLS_REPO.to_string(), vec![tools]);

    let plan = resolve_with(releases, &request(true), LINUX_X64).await.unwrap();

    assert!(plan.tools.is_none());
    assert!(plan.picotool.download_url.is_some());
}

#[tokio::test]
async fn tools_listing_failure_is_skipped() {
    let mut releases = FakeReleases::standard();
    releases.fail_listing = true;

    let plan = resolve_with(releases, &request(true), LINUX_X64).await.unwrap();

    assert!(plan.tools.is_none());
    assert_eq!(plan.components().len(), 6);
}

#[tokio::test]
async fn tools_falls_back_to_newest_release() {
    let mut req = request(true);
    req.sdk = "2.3.0".into();
    let mut releases = FakeReleases::standard();
    releases.add(
        SDK_TOOLS_REPO,
        release("v2.3.0-0", &["pico-sdk-tools-2.3.0-x86_64-lin.tar.gz"]),
    );
    let plan = resolve_with(releases, &req, LINUX_X64).await.unwrap();
    assert!(url_of(&plan, ComponentId::Tools).ends_with("/v2.3.0-0/pico-sdk-tools-2.3.0-x86_64-lin.tar.gz"));

    // No tag mentions 2.4.0: the newest tag (v2.2.0-3) is tried and has no 2.4.0 asset.
    req.sdk = "2.4.0".into();
    let plan = resolve_with(FakeReleases::standard(), &req, LINUX_X64)
        .await
        .unwrap();
    assert!(plan.tools.is_none());
}

#[tokio::test]
async fn draft_tools_releases_are_ignored() {
    let mut releases = FakeReleases::standard();
    let mut draft = release("v2.2.0-9", &["pico-sdk-tools-2.2.0-x86_64-lin.tar.gz"]);
    draft.is_draft = true;
    releases.add(SDK_TOOLS_REPO, draft);

    let plan = resolve_with(releases, &request(true), LINUX_X64).await.unwrap();
    assert!(url_of(&plan, ComponentId::Tools).contains("/v2.2.0-3/"));
}

#[tokio::test]
async fn missing_cmake_release_names_the_host() {
    let mut req = request(false);
    req.cmake = "3.99.0".into();
    let err = resolve_with(FakeReleases::standard(), &req, MAC_ARM)
        .await
        .unwrap_err();

    match err {
        Error::NotFound {
            component,
            version,
            host,
            ..
        } => {
            assert_eq!(component, "cmake");
            assert_eq!(version, "v3.99.0");
            assert_eq!(host, "macos/aarch64");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_cmake_asset_is_not_found() {
    let mut releases = FakeReleases::default();
    for (repo, r) in [
        (SDK_TOOLS_REPO, sdk_tools_release()),
        (NINJA_REPO, release("v1.12.1", &["ninja-linux.zip"])),
        (CMAKE_REPO, release("v3.31.5", &["cmake-3.31.5-windows-x86_64.zip"])),
    ] {
        releases.add(repo, r);
    }
    let err = resolve_with(releases, &request(false), LINUX_X64)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { ref component, .. } if component == "cmake"));
}

#[tokio::test]
async fn unmapped_picotool_version_uses_guessed_tag() {
    let mut req = request(false);
    req.picotool = "2.3.0".into();
    let mut releases = FakeReleases::standard();
    releases.add(
        SDK_TOOLS_REPO,
        release("v2.3.0-0", &["picotool-2.3.0-x86_64-lin.tar.gz"]),
    );

    let plan = resolve_with(releases, &req, LINUX_X64).await.unwrap();
    assert!(url_of(&plan, ComponentId::Picotool).ends_with("/v2.3.0-0/picotool-2.3.0-x86_64-lin.tar.gz"));
}

#[tokio::test]
async fn http_errors_propagate_unchanged() {
    struct Down;

    #[async_trait]
    impl ReleaseSource for Down {
        async fn list_releases(&self, _: Repository, _: usize) -> Result<Vec<Release>> {
            Ok(Vec::new())
        }
        async fn get_release_by_tag(&self, repo: Repository, _: &str) -> Result<Release> {
            Err(Error::http(format!("fake://{repo}"), 403, "rate limited"))
        }
        async fn list_tags(&self, _: Repository, _: usize) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    let err = VersionResolver::new(Arc::new(Down), Arc::new(FakeIndex::new(INDEX)))
        .resolve(&request(false), LINUX_X64)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn blank_required_version_is_rejected_before_any_lookup() {
    let releases = Arc::new(FakeReleases::standard());
    let index = Arc::new(FakeIndex::new(INDEX));
    let mut req = request(true);
    req.ninja = "  ".into();

    let err = VersionResolver::new(releases.clone(), index.clone())
        .resolve(&req, LINUX_X64)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidRequest(_)));
    assert_eq!(releases.calls(), 0);
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn prefer_installed_skips_all_lookups() {
    let releases = Arc::new(FakeReleases::default());
    let index = Arc::new(FakeIndex::new(""));
    let probe: Arc<dyn InstallProbe> = Arc::new(|_: &str| true);

    let plan = VersionResolver::new(releases.clone(), index.clone())
        .prefer_installed(probe)
        .resolve(&request(true), LINUX_X64)
        .await
        .unwrap();

    assert_eq!(releases.calls(), 0);
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    assert_eq!(plan.components().len(), 7);
    assert!(plan.components().iter().all(|c| !c.needs_install()));
    assert_eq!(plan.cmake.install_path, "cmake/v3.31.5");
}

#[tokio::test]
async fn prefer_installed_only_skips_present_components() {
    let releases = Arc::new(FakeReleases::standard());
    let probe: Arc<dyn InstallProbe> = Arc::new(|path: &str| path == "cmake/v3.31.5");

    let plan = VersionResolver::new(releases.clone(), Arc::new(FakeIndex::new(INDEX)))
        .prefer_installed(probe)
        .resolve(&request(false), LINUX_X64)
        .await
        .unwrap();

    assert!(!plan.cmake.needs_install());
    assert!(plan.ninja.needs_install());
    // ninja, picotool and openocd only.
    assert_eq!(releases.calls(), 3);
}

#[tokio::test]
async fn every_host_resolves_deterministically() {
    let resolve_on = |env: HostEnvironment| async move {
        VersionResolver::new(
            Arc::new(FakeReleases::standard()),
            Arc::new(FakeIndex::new(FULL_INDEX)),
        )
        .resolve(&request(true), env)
        .await
        .unwrap()
    };

    for env in HostEnvironment::all() {
        let first = resolve_on(env).await;
        let second = resolve_on(env).await;
        assert_eq!(first, second, "{env}");
        assert_eq!(first.env, env);
        assert_eq!(first.components().len(), 7, "{env}");
    }
}

#[tokio::test]
async fn macos_hosts_share_universal_archives() {
    let x64 = resolve_with(FakeReleases::standard(), &request(true), MAC_X64)
        .await
        .unwrap();
    let arm = resolve_with(FakeReleases::standard(), &request(true), MAC_ARM)
        .await
        .unwrap();

    assert!(url_of(&x64, ComponentId::Cmake).ends_with("/cmake-3.31.5-macos-universal.tar.gz"));
    for id in [
        ComponentId::Cmake,
        ComponentId::Ninja,
        ComponentId::Tools,
        ComponentId::Picotool,
        ComponentId::Openocd,
    ] {
        assert_eq!(url_of(&x64, id), url_of(&arm, id), "{id}");
    }
    assert_ne!(
        url_of(&x64, ComponentId::Toolchain),
        url_of(&arm, ComponentId::Toolchain)
    );
}

#[tokio::test]
async fn linux_arm_picks_arch_specific_ninja() {
    let index = "[14_2_Rel1]\nlinux_arm64 = https://developer.arm.com/14.2/aarch64.tar.xz\n";
    let plan = VersionResolver::new(
        Arc::new(FakeReleases::standard()),
        Arc::new(FakeIndex::new(index)),
    )
    .resolve(&request(true), LINUX_ARM)
    .await
    .unwrap();

    assert!(url_of(&plan, ComponentId::Ninja).ends_with("/ninja-linux-aarch64.zip"));
    assert!(url_of(&plan, ComponentId::Cmake).ends_with("/cmake-3.31.5-linux-aarch64.tar.gz"));
    assert!(url_of(&plan, ComponentId::Tools).ends_with("/pico-sdk-tools-2.2.0-aarch64-lin.tar.gz"));
}

fn host() -> impl Strategy<Value = HostEnvironment> {
    prop::sample::select(HostEnvironment::all().to_vec())
}

proptest! {
    /// Unrelated assets never change which asset is chosen.
    #[test]
    fn unrelated_assets_do_not_affect_selection(
        env in host(),
        noise in prop::collection::vec("[a-z]{1,12}\\.(txt|sha256|json)", 0..8),
        noise_first in any::<bool>(),
    ) {
        let base = sdk_tools_release();
        let mut noisy = base.clone();
        let extra = noise.iter().map(|n| ReleaseAsset::new(n.as_str(), format!("https://dl.example/{n}")));
        if noise_first {
            let mut assets: Vec<ReleaseAsset> = extra.collect();
            assets.extend(noisy.assets);
            noisy.assets = assets;
        } else {
            noisy.assets.extend(extra);
        }

        for (id, version) in [
            (ComponentId::Tools, "2.2.0"),
            (ComponentId::Picotool, "2.2.0-a4"),
            (ComponentId::Openocd, "0.12.0+dev"),
        ] {
            prop_assert_eq!(
                select_asset(id, &base, env, version).map(|a| a.name.clone()),
                select_asset(id, &noisy, env, version).map(|a| a.name.clone())
            );
            prop_assert!(select_asset(id, &noisy, env, version).is_some());
        }
    }
}
