//! `picoup install` and `picoup plan-install`

use std::fmt::Write as _;
use std::path::Path;

use picoup_core::{HostEnvironment, InstallPlan, InstallRequest};
use picoup_installer::{InstallReport, Outcome};
use tracing::warn;

use super::build_installer;
use super::resolve::resolve_plan;
use crate::cli::CliError;
use crate::config::Settings;

/// One line per component, then a count.
#[must_use]
pub fn render_report(report: &InstallReport, root: &Path) -> String {
    let mut out = String::new();
    for (id, version, outcome) in &report.outcomes {
        let label = format!("{id} {version}");
        let _ = match outcome {
            Outcome::Installed { path } => writeln!(out, "{label:<24} installed  {}", path.display()),
            Outcome::Skipped { path } => writeln!(out, "{label:<24} present    {}", path.display()),
        };
    }
    let _ = write!(
        out,
        "{} of {} components installed under {}",
        report.installed_count(),
        report.outcomes.len(),
        root.display()
    );
    out
}

/// Install an already-resolved plan.
///
/// # Errors
///
/// Returns the first component failure.
pub async fn install_plan(settings: &Settings, plan: &InstallPlan) -> Result<String, CliError> {
    let installer = build_installer(settings)?;
    let report = installer.install(plan).await?;
    Ok(render_report(&report, installer.root()))
}

/// Resolve for the detected host, then install.
///
/// # Errors
///
/// Fails on resolution or installation failures.
pub async fn execute(settings: &Settings, request: InstallRequest) -> Result<String, CliError> {
    let env = HostEnvironment::detect()?;
    let plan = resolve_plan(settings, &request, env).await?;
    install_plan(settings, &plan).await
}

/// Install from a JSON plan file.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, if it was resolved for a
/// different host, or on installation failures.
pub async fn execute_plan_file(settings: &Settings, path: &Path) -> Result<String, CliError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::config(format!("Cannot read plan file {}: {e}", path.display()))
    })?;
    let plan = InstallPlan::from_json(&text)?;

    let env = HostEnvironment::detect()?;
    if plan.env != env {
        warn!(plan_host = %plan.env, %env, "Plan host mismatch");
        return Err(CliError::config_with_help(
            format!("Plan was resolved for {} but this host is {env}", plan.env),
            "Run `picoup resolve --json` on this host to produce a matching plan",
        ));
    }
    install_plan(settings, &plan).await
}
