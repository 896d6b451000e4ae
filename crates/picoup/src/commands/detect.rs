//! `picoup detect`

use picoup_core::HostEnvironment;

use crate::cli::CliError;

/// Print the host pair, e.g. `linux/x86_64`.
///
/// # Errors
///
/// Fails on hosts outside the supported set.
pub fn execute() -> Result<String, CliError> {
    Ok(HostEnvironment::detect()?.to_string())
}
