//! Command implementations.
//!
//! Every command returns its stdout text; printing and exit codes stay in
//! `main`.

pub mod detect;
pub mod install;
pub mod resolve;
pub mod toolchains;

use std::sync::Arc;

use picoup_installer::Installer;
use picoup_resolver::{FsProbe, VersionResolver};
use picoup_tools_github::GitHubClient;
use picoup_tools_index::{IndexLoader, default_fallbacks};

use crate::cli::{CliError, Commands, GlobalArgs};
use crate::config::Settings;

/// Index loader configured from settings.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_index_loader(settings: &Settings) -> Result<IndexLoader, CliError> {
    Ok(IndexLoader::new()?
        .with_remote_url(settings.index_url.clone())
        .with_fallbacks(default_fallbacks(settings.resources_dir.clone())))
}

/// Resolver wired to GitHub and the toolchain index.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built.
pub fn build_resolver(settings: &Settings) -> Result<VersionResolver, CliError> {
    let github = GitHubClient::new()?
        .with_token(settings.github_token.clone())
        .with_base_url(settings.api_base.clone());
    let resolver = VersionResolver::new(Arc::new(github), Arc::new(build_index_loader(settings)?));

    Ok(if settings.prefer_installed {
        resolver.prefer_installed(Arc::new(FsProbe::new(&settings.root)))
    } else {
        resolver
    })
}

/// Installer rooted at the configured install root.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_installer(settings: &Settings) -> Result<Installer, CliError> {
    Ok(Installer::new(&settings.root)?)
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns the command's failure.
pub async fn execute(command: Commands, global: &GlobalArgs) -> Result<String, CliError> {
    match command {
        Commands::Detect => detect::execute(),
        Commands::Resolve { versions, json } => {
            let settings = Settings::load(global)?;
            resolve::execute(&settings, versions.into(), json).await
        }
        Commands::Install { versions } => {
            let settings = Settings::load(global)?;
            install::execute(&settings, versions.into()).await
        }
        Commands::Toolchains => {
            let settings = Settings::load(global)?;
            toolchains::execute(&settings).await
        }
        Commands::PlanInstall { plan } => {
            let settings = Settings::load(global)?;
            install::execute_plan_file(&settings, &plan).await
        }
    }
}
