//! Dependency Installer
//!
//! Boundary to the external package manager. The default implementation runs
//! `<program> add <source>` / `<program> install` in the project directory.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info};

use crate::common::{HubError, HubResult};

/// External installer invoked by `add` and `serve`
#[allow(async_fn_in_trait)]
pub trait Installer {
    /// Add a dependency from a resolved source location
    async fn add(&self, source: &str) -> HubResult<()>;

    /// Install every dependency the project declares
    async fn install(&self) -> HubResult<()>;
}

/// Installer backed by a package-manager command such as `poetry`
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    project_dir: PathBuf,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            project_dir: project_dir.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> HubResult<()> {
        let command = format!("{} {}", self.program, args.join(" "));
        info!("Running `{}` in {:?}", command, self.project_dir);

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| HubError::Install {
                command: command.clone(),
                reason: format!("failed to spawn: {}", e),
            })?;

        if !status.success() {
            error!("`{}` exited with {}", command, status);
            return Err(HubError::Install {
                command,
                reason: format!("exited with {}", status),
            });
        }

        Ok(())
    }
}

impl Installer for CommandInstaller {
    async fn add(&self, source: &str) -> HubResult<()> {
        self.run(&["add", source]).await
    }

    async fn install(&self) -> HubResult<()> {
        self.run(&["install"]).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_exit() {
        let dir = tempfile::tempdir().unwrap();
        let installer = CommandInstaller::new("true", dir.path());
        installer.add("git+https://example.com/repo.git").await.unwrap();
        installer.install().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_install_error() {
        let dir = tempfile::tempdir().unwrap();
        let installer = CommandInstaller::new("false", dir.path());
        let err = installer.install().await.unwrap_err();
        assert!(matches!(err, HubError::Install { ref command, .. } if command == "false install"));
    }

    #[tokio::test]
    async fn test_missing_program_is_install_error() {
        let dir = tempfile::tempdir().unwrap();
        let installer = CommandInstaller::new("servehub-no-such-program", dir.path());
        let err = installer.add("pkg").await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
