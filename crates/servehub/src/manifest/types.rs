//! Manifest Types
//!
//! Typed view of the `tool.<namespace>` section of a project manifest.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::{HubError, HubResult};

/// Importable object exposed by a package: `(module, attribute)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub module: String,
    pub attr: String,
}

impl EntryPoint {
    pub fn new(module: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            attr: attr.into(),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.attr)
    }
}

/// A mount path paired with the entry point served under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub path: String,
    #[serde(flatten)]
    pub entry: EntryPoint,
}

/// Mount path → entry point, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    mounts: Vec<Mount>,
}

impl MountTable {
    pub const fn new() -> Self {
        Self { mounts: Vec::new() }
    }

    /// Insert or overwrite; an existing path keeps its position.
    /// Returns the previous entry point, if any.
    pub fn upsert(&mut self, path: &str, entry: EntryPoint) -> HubResult<Option<EntryPoint>> {
        validate_mount_path(path)?;

        if let Some(existing) = self.mounts.iter_mut().find(|m| m.path == path) {
            return Ok(Some(std::mem::replace(&mut existing.entry, entry)));
        }

        self.mounts.push(Mount {
            path: path.to_string(),
            entry,
        });
        Ok(None)
    }

    pub fn remove(&mut self, path: &str) -> HubResult<EntryPoint> {
        let idx = self
            .mounts
            .iter()
            .position(|m| m.path == path)
            .ok_or_else(|| HubError::MountNotFound(path.to_string()))?;
        Ok(self.mounts.remove(idx).entry)
    }

    pub fn get(&self, path: &str) -> Option<&EntryPoint> {
        self.mounts.iter().find(|m| m.path == path).map(|m| &m.entry)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

impl<'a> IntoIterator for &'a MountTable {
    type Item = &'a Mount;
    type IntoIter = std::slice::Iter<'a, Mount>;

    fn into_iter(self) -> Self::IntoIter {
        self.mounts.iter()
    }
}

/// Contents of `tool.<namespace>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubSection {
    pub paths: MountTable,
    pub export_module: Option<String>,
    pub export_attr: Option<String>,
}

pub fn validate_mount_path(path: &str) -> HubResult<()> {
    if !path.starts_with('/') {
        return Err(HubError::InvalidMountPath(path.to_string()));
    }
    Ok(())
}
