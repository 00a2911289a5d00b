//! Serve Boundary
//!
//! Builds an explicit registry of mounted packages at startup and hands it to
//! an external serving runtime. Loading `(module, attr)` pairs is the
//! runtime's job; this module only decides what gets mounted where.

use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info};

use crate::common::{HubError, HubResult};
use crate::config::ServeSettings;
use crate::manifest::types::validate_mount_path;
use crate::manifest::{EntryPoint, ManifestDocument, MountTable};

/// Environment variable carrying the mount registry as JSON
pub const MOUNTS_ENV: &str = "SERVEHUB_MOUNTS";
pub const HOST_ENV: &str = "SERVEHUB_HOST";
pub const PORT_ENV: &str = "SERVEHUB_PORT";

/// One package to expose, as handed to the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountHandle {
    pub path: String,
    pub module: String,
    pub attr: String,
}

/// Mounted packages, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountRegistry {
    handles: Vec<MountHandle>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mounts(mounts: &MountTable) -> HubResult<Self> {
        let mut registry = Self::new();
        for mount in mounts {
            registry.register(&mount.path, &mount.entry)?;
        }
        Ok(registry)
    }

    pub fn from_manifest(manifest: &ManifestDocument) -> HubResult<Self> {
        Self::from_mounts(manifest.list_mounts())
    }

    pub fn register(&mut self, path: &str, entry: &EntryPoint) -> HubResult<()> {
        validate_mount_path(path)?;
        if self.handles.iter().any(|h| h.path == path) {
            return Err(HubError::InvalidState(format!(
                "{} is already registered",
                path
            )));
        }

        self.handles.push(MountHandle {
            path: path.to_string(),
            module: entry.module.clone(),
            attr: entry.attr.clone(),
        });
        Ok(())
    }

    pub fn handles(&self) -> &[MountHandle] {
        &self.handles
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn to_json(&self) -> HubResult<String> {
        serde_json::to_string(&self.handles)
            .map_err(|e| HubError::InvalidState(format!("Failed to serialize mounts: {}", e)))
    }
}

/// Something that can serve a mount registry over HTTP
#[allow(async_fn_in_trait)]
pub trait ServeRuntime {
    async fn serve(&self, registry: &MountRegistry) -> HubResult<()>;
}

/// Runs the configured runtime command with the registry in its environment
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    command: Vec<String>,
    host: String,
    port: u16,
    project_dir: PathBuf,
}

impl ProcessRuntime {
    pub fn new(settings: &ServeSettings, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: settings.command.clone(),
            host: settings.host.clone(),
            port: settings.port,
            project_dir: project_dir.into(),
        }
    }

    pub fn docs_url(&self) -> String {
        format!("http://{}:{}/docs", self.host, self.port)
    }
}

impl ServeRuntime for ProcessRuntime {
    async fn serve(&self, registry: &MountRegistry) -> HubResult<()> {
        let shown = self.command.join(" ");
        let (program, args) = self.command.split_first().ok_or_else(|| HubError::Serve {
            command: shown.clone(),
            reason: "no runtime command configured".to_string(),
        })?;

        for handle in registry.handles() {
            info!("Mounting {}:{} at {}", handle.module, handle.attr, handle.path);
        }
        info!("Check out the docs at {}", self.docs_url());

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.project_dir)
            .env(MOUNTS_ENV, registry.to_json()?)
            .env(HOST_ENV, &self.host)
            .env(PORT_ENV, self.port.to_string())
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| HubError::Serve {
                command: shown.clone(),
                reason: format!("failed to spawn: {}", e),
            })?;

        if !status.success() {
            error!("`{}` exited with {}", shown, status);
            return Err(HubError::Serve {
                command: shown,
                reason: format!("exited with {}", status),
            });
        }

        Ok(())
    }
}
