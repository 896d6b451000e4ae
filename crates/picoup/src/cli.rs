//! Command-line definitions and error-to-exit-code mapping.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::Diagnostic;
use picoup_core::InstallRequest;
use thiserror::Error;

use crate::tracing::{LogLevel, TracingFormat};

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Any failure without a more specific code.
pub const EXIT_FAILURE: i32 = 1;
/// Host OS/arch is not supported.
pub const EXIT_UNSUPPORTED_PLATFORM: i32 = 2;
/// A version, tag or asset could not be found.
pub const EXIT_NOT_FOUND: i32 = 3;
/// A network request failed.
pub const EXIT_HTTP: i32 = 4;
/// An external command (git, tar) failed.
pub const EXIT_COMMAND_FAILED: i32 = 5;

/// Errors surfaced by the binary.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Bad settings file or option combination.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(picoup::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// Failure from the resolver or installer.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] picoup_core::Error),
}

impl CliError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Map an error to the process exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    use picoup_core::Error;
    match err {
        CliError::Core(Error::UnsupportedPlatform { .. }) => EXIT_UNSUPPORTED_PLATFORM,
        CliError::Core(Error::NotFound { .. }) => EXIT_NOT_FOUND,
        CliError::Core(Error::Http { .. }) => EXIT_HTTP,
        CliError::Core(Error::CommandFailed { .. }) => EXIT_COMMAND_FAILED,
        _ => EXIT_FAILURE,
    }
}

/// Resolve and install Raspberry Pi Pico SDK components.
#[derive(Debug, Parser)]
#[command(name = "picoup", version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(long, global = true, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command that touches the network or disk.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Install root [default: ~/.pico-sdk].
    #[arg(long, global = true, env = "PICOUP_ROOT")]
    pub root: Option<PathBuf>,

    /// GitHub token for the releases API; `GH_TOKEN` is also honoured.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Plan components already present under the root without looking them up.
    #[arg(long, global = true)]
    pub prefer_installed: bool,

    /// Skip the hosted toolchain index and use the bundled copy.
    #[arg(long, global = true)]
    pub offline_index: bool,

    /// Settings file [default: <config dir>/picoup/config.toml].
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the detected host OS and architecture.
    Detect,

    /// Resolve component versions into an install plan.
    Resolve {
        #[command(flatten)]
        versions: VersionArgs,

        /// Print the plan as canonical JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve and then install every component.
    Install {
        #[command(flatten)]
        versions: VersionArgs,
    },

    /// List toolchain versions available for this host.
    Toolchains,

    /// Install from a saved JSON plan without resolving again.
    PlanInstall {
        /// Path to a plan written by `resolve --json`.
        plan: PathBuf,
    },
}

/// Requested component versions.
#[derive(Debug, Clone, Args)]
pub struct VersionArgs {
    /// SDK version (also selects the tools bundle).
    #[arg(long)]
    pub sdk: String,

    /// Toolchain version key, e.g. `14_2_Rel1`.
    #[arg(long)]
    pub toolchain: String,

    /// CMake version.
    #[arg(long)]
    pub cmake: String,

    /// Ninja version.
    #[arg(long)]
    pub ninja: String,

    /// picotool version.
    #[arg(long)]
    pub picotool: String,

    /// OpenOCD version.
    #[arg(long)]
    pub openocd: String,

    /// Do not include the prebuilt tools bundle.
    #[arg(long)]
    pub no_tools: bool,
}

impl From<VersionArgs> for InstallRequest {
    fn from(args: VersionArgs) -> Self {
        Self {
            sdk: args.sdk,
            toolchain: args.toolchain,
            cmake: args.cmake,
            ninja: args.ninja,
            picotool: args.picotool,
            openocd: args.openocd,
            include_tools: !args.no_tools,
        }
    }
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
