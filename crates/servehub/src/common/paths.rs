//! Path Utilities
//!
//! Common path resolution for servehub directories and files.

use std::path::PathBuf;

use super::{HubError, HubResult};

/// Manifest file of the consuming project, relative to the working directory
pub const DEFAULT_PROJECT_MANIFEST: &str = "pyproject.toml";

/// Get the servehub base directory (`~/.servehub/`)
pub fn servehub_dir() -> HubResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        HubError::InvalidSettings("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".servehub"))
}

/// Get the default settings file (`~/.servehub/config.json`)
pub fn config_path() -> HubResult<PathBuf> {
    Ok(servehub_dir()?.join("config.json"))
}
