//! The version resolver: request + host → install plan.

use std::sync::Arc;

use futures::try_join;
use picoup_core::{
    ComponentId, ComponentPlan, Error, HostEnvironment, IndexSource, InstallPlan, InstallRequest,
    PlatformKey, Release, ReleaseSource, Repository, Result,
};
use tracing::{debug, info, warn};

use crate::probe::InstallProbe;
use crate::select::select_asset;
use crate::upstream::{
    CMAKE_REPO, NINJA_REPO, PICO_SDK_CLONE_URL, SDK_TOOLS_REPO, install_path,
    sdk_tools_release_tag, v_tag,
};

/// How many tools-bundle releases to consider.
pub const DEFAULT_TOOLS_RELEASE_LIMIT: usize = 100;

/// Resolves every component of an [`InstallRequest`] into an [`InstallPlan`].
///
/// Component resolutions are independent and run concurrently. A failure on
/// a required component aborts the whole resolve with no partial plan; the
/// optional tools bundle never fails the resolve.
pub struct VersionResolver {
    releases: Arc<dyn ReleaseSource>,
    index: Arc<dyn IndexSource>,
    installed: Option<Arc<dyn InstallProbe>>,
    tools_release_limit: usize,
}

impl VersionResolver {
    /// Create a resolver over the given metadata sources.
    #[must_use]
    pub fn new(releases: Arc<dyn ReleaseSource>, index: Arc<dyn IndexSource>) -> Self {
        Self {
            releases,
            index,
            installed: None,
            tools_release_limit: DEFAULT_TOOLS_RELEASE_LIMIT,
        }
    }

    /// Prefer already-installed components: any component whose install path
    /// the probe reports as present is planned without a network call.
    #[must_use]
    pub fn prefer_installed(mut self, probe: Arc<dyn InstallProbe>) -> Self {
        self.installed = Some(probe);
        self
    }

    /// Limit the tools-bundle release listing.
    #[must_use]
    pub fn with_tools_release_limit(mut self, limit: usize) -> Self {
        self.tools_release_limit = limit;
        self
    }

    /// Resolve a request for a host.
    ///
    /// # Errors
    ///
    /// Returns the first required-component failure: [`Error::InvalidRequest`],
    /// [`Error::NotFound`], [`Error::Http`] or [`Error::IndexUnavailable`].
    pub async fn resolve(&self, request: &InstallRequest, env: HostEnvironment) -> Result<InstallPlan> {
        request.validate()?;
        info!(%env, sdk = %request.sdk, toolchain = %request.toolchain, "Resolving install plan");

        let (sdk, toolchain, tools, ninja, cmake, picotool, openocd) = try_join!(
            async { Ok::<_, Error>(self.resolve_sdk(request)) },
            self.resolve_toolchain(request, env),
            async { Ok(self.resolve_tools(request, env).await) },
            self.resolve_ninja(request, env),
            self.resolve_cmake(request, env),
            self.resolve_sdk_tools_product(ComponentId::Picotool, &request.picotool, env),
            self.resolve_sdk_tools_product(ComponentId::Openocd, &request.openocd, env),
        )?;

        Ok(InstallPlan {
            env,
            request: request.clone(),
            sdk,
            toolchain,
            tools,
            ninja,
            cmake,
            picotool,
            openocd,
        })
    }

    fn already_installed(&self, id: ComponentId, version: &str) -> Option<ComponentPlan> {
        let probe = self.installed.as_ref()?;
        let path = install_path(id, version);
        if probe.exists(&path) {
            info!(component = %id, %path, "Already installed, skipping resolution");
            Some(ComponentPlan::already_installed(id, version, path))
        } else {
            None
        }
    }

    fn resolve_sdk(&self, request: &InstallRequest) -> ComponentPlan {
        let version = &request.sdk;
        if let Some(plan) = self.already_installed(ComponentId::Sdk, version) {
            return plan;
        }
        ComponentPlan::clone_repo(
            ComponentId::Sdk,
            version,
            install_path(ComponentId::Sdk, version),
            PICO_SDK_CLONE_URL,
            format!("git clone of {PICO_SDK_CLONE_URL} at tag {version}"),
        )
    }

    async fn resolve_toolchain(
        &self,
        request: &InstallRequest,
        env: HostEnvironment,
    ) -> Result<ComponentPlan> {
        let id = ComponentId::Toolchain;
        let version = &request.toolchain;
        if let Some(plan) = self.already_installed(id, version) {
            return Ok(plan);
        }

        let index = self.index.load_index().await?;
        let key = PlatformKey::from(env);
        let url = index.url_for(version, key).ok_or_else(|| {
            Error::not_found(id.tag(), "toolchain version", version, format!("{key} ({env})"))
        })?;

        info!(%version, %key, provenance = %index.provenance, %url, "Resolved toolchain");
        Ok(ComponentPlan::download(
            id,
            version,
            install_path(id, version),
            url,
            format!("toolchain index ({}) key {key}", index.provenance),
        ))
    }

    /// Best effort: every failure path logs and yields `None`.
    async fn resolve_tools(
        &self,
        request: &InstallRequest,
        env: HostEnvironment,
    ) -> Option<ComponentPlan> {
        if !request.include_tools {
            return None;
        }
        let id = ComponentId::Tools;
        let version = &request.sdk;
        if let Some(plan) = self.already_installed(id, version) {
            return Some(plan);
        }

        let mut releases: Vec<Release> = match self
            .releases
            .list_releases(SDK_TOOLS_REPO, self.tools_release_limit)
            .await
        {
            Ok(releases) => releases.into_iter().filter(|r| !r.is_draft).collect(),
            Err(e) => {
                warn!(error = %e, "Could not list tools releases, skipping tools bundle");
                return None;
            }
        };
        releases.sort_by(|a, b| b.tag.cmp(&a.tag));

        let Some(release) = releases
            .iter()
            .find(|r| r.tag.contains(version.as_str()))
            .or_else(|| releases.first())
        else {
            warn!(repo = %SDK_TOOLS_REPO, "No tools releases published, skipping tools bundle");
            return None;
        };
        debug!(tag = %release.tag, "Chose tools release");

        let Some(asset) = select_asset(id, release, env, version) else {
            warn!(
                tag = %release.tag,
                %version,
                %env,
                available = ?release.asset_names(),
                "No tools bundle for this host, skipping"
            );
            return None;
        };

        info!(tag = %release.tag, asset = %asset.name, "Resolved tools bundle");
        Some(ComponentPlan::download(
            id,
            version,
            install_path(id, version),
            &asset.download_url,
            format!("{SDK_TOOLS_REPO} release {}, asset {}", release.tag, asset.name),
        ))
    }

    async fn resolve_ninja(
        &self,
        request: &InstallRequest,
        env: HostEnvironment,
    ) -> Result<ComponentPlan> {
        let version = &request.ninja;
        if let Some(plan) = self.already_installed(ComponentId::Ninja, version) {
            return Ok(plan);
        }
        self.resolve_tagged_release(ComponentId::Ninja, NINJA_REPO, version, &v_tag(version), env)
            .await
    }

    async fn resolve_cmake(
        &self,
        request: &InstallRequest,
        env: HostEnvironment,
    ) -> Result<ComponentPlan> {
        let version = &request.cmake;
        if let Some(plan) = self.already_installed(ComponentId::Cmake, version) {
            return Ok(plan);
        }
        self.resolve_tagged_release(ComponentId::Cmake, CMAKE_REPO, version, &v_tag(version), env)
            .await
    }

    async fn resolve_sdk_tools_product(
        &self,
        id: ComponentId,
        version: &str,
        env: HostEnvironment,
    ) -> Result<ComponentPlan> {
        if let Some(plan) = self.already_installed(id, version) {
            return Ok(plan);
        }
        let lookup = sdk_tools_release_tag(id, version);
        if lookup.guessed {
            warn!(
                component = %id,
                %version,
                tag = %lookup.tag,
                "Version not in release-tag table, guessing tag"
            );
        }
        self.resolve_tagged_release(id, SDK_TOOLS_REPO, version, &lookup.tag, env)
            .await
    }

    /// Fetch one release by exact tag and select the component's asset from it.
    async fn resolve_tagged_release(
        &self,
        id: ComponentId,
        repo: Repository,
        version: &str,
        tag: &str,
        env: HostEnvironment,
    ) -> Result<ComponentPlan> {
        let release = self
            .releases
            .get_release_by_tag(repo, tag)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::not_found(id.tag(), format!("{repo} release tag"), tag, env.to_string())
                } else {
                    e
                }
            })?;

        let asset = select_asset(id, &release, env, version).ok_or_else(|| {
            debug!(component = %id, %tag, available = ?release.asset_names(), "No matching asset");
            Error::not_found(id.tag(), "matching release asset", tag, env.to_string())
        })?;

        info!(component = %id, %tag, asset = %asset.name, "Resolved release asset");
        Ok(ComponentPlan::download(
            id,
            version,
            install_path(id, version),
            &asset.download_url,
            format!("{repo} release {tag}, asset {}", asset.name),
        ))
    }
}

impl std::fmt::Debug for VersionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver")
            .field("prefer_installed", &self.installed.is_some())
            .field("tools_release_limit", &self.tools_release_limit)
            .finish_non_exhaustive()
    }
}
