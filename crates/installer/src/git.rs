//! SDK checkout via the system `git`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use picoup_core::{Error, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::extract::sibling;

/// Runs `git` to produce shallow checkouts.
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Default for Git {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl Git {
    /// Use a specific `git` executable.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Shallow-clone `url` at `tag` into `dest` and initialise submodules.
    ///
    /// The clone happens in a hidden sibling directory that is renamed onto
    /// `dest` once both steps succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] with the command line, exit status and
    /// captured stderr when either git step exits non-zero.
    pub async fn clone_at_tag(&self, url: &str, tag: &str, dest: &Path) -> Result<()> {
        let staging = sibling(dest, "clone");
        if staging.exists() {
            tokio::fs::remove_dir_all(&staging).await?;
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(%url, %tag, dest = %dest.display(), "Cloning");
        let result = async {
            self.run(
                None,
                [
                    "clone".into(),
                    "--depth".into(),
                    "1".into(),
                    "--branch".into(),
                    tag.into(),
                    "--".into(),
                    url.into(),
                    staging.clone().into_os_string(),
                ],
            )
            .await?;
            self.run(
                Some(&staging),
                ["submodule".into(), "update".into(), "--init".into()],
            )
            .await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        if dest.exists() {
            tokio::fs::remove_dir_all(dest).await?;
        }
        tokio::fs::rename(&staging, dest).await?;
        Ok(())
    }

    async fn run<const N: usize>(&self, cwd: Option<&Path>, args: [OsString; N]) -> Result<()> {
        let rendered = std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %rendered, "Running git");

        let mut command = Command::new(&self.program);
        command.args(&args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::command_failed(
                rendered,
                output.status.to_string(),
                String::from_utf8_lossy(&output.stderr).trim(),
            ))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_git_reports_command() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("sdk").join("2.2.0");

        let err = Git::with_program("false")
            .clone_at_tag("https://example.invalid/sdk.git", "2.2.0", &dest)
            .await
            .unwrap_err();

        match err {
            Error::CommandFailed { command, .. } => {
                assert!(command.starts_with("false clone --depth 1 --branch 2.2.0 -- "));
                assert!(command.contains("-- https://example.invalid/sdk.git "));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
        assert!(!dest.exists());
        assert!(!sibling(&dest, "clone").exists());
    }
}
