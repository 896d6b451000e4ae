//! `picoup resolve`

use picoup_core::{HostEnvironment, InstallPlan, InstallRequest};
use tracing::info;

use super::build_resolver;
use crate::cli::CliError;
use crate::config::Settings;

/// Resolve `request` for `env`.
///
/// # Errors
///
/// Returns the resolver's failure.
pub async fn resolve_plan(
    settings: &Settings,
    request: &InstallRequest,
    env: HostEnvironment,
) -> Result<InstallPlan, CliError> {
    let plan = build_resolver(settings)?.resolve(request, env).await?;
    info!(components = plan.components().len(), "Plan resolved");
    Ok(plan)
}

/// Render the plan as text or canonical JSON.
///
/// # Errors
///
/// Returns an error if the plan cannot be serialized.
pub fn render(plan: &InstallPlan, json: bool) -> Result<String, CliError> {
    if json {
        Ok(plan.to_canonical_json()?)
    } else {
        Ok(plan.render_text().trim_end().to_string())
    }
}

/// Resolve for the detected host and render.
///
/// # Errors
///
/// Fails on unsupported hosts and resolution failures.
pub async fn execute(
    settings: &Settings,
    request: InstallRequest,
    json: bool,
) -> Result<String, CliError> {
    let env = HostEnvironment::detect()?;
    let plan = resolve_plan(settings, &request, env).await?;
    render(&plan, json)
}
