//! Manifest Document
//!
//! A project manifest either backed by a local file (mutable, persistable) or
//! a read-only snapshot of a remote or foreign package's manifest.

use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;
use tracing::{debug, info};

use servehub_protocol::{redact_query, HubTransport};

use super::loader::{
    parse_document, read_hub_section, read_manifest_file, write_mounts, EXPORT_ATTR_KEY,
    EXPORT_MODULE_KEY,
};
use super::types::{EntryPoint, HubSection, MountTable};
use crate::common::{HubError, HubResult};

static EMPTY_MOUNTS: MountTable = MountTable::new();

#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    File(PathBuf),
    Snapshot(String),
}

impl Origin {
    fn describe(&self) -> String {
        match self {
            Origin::File(path) => path.display().to_string(),
            Origin::Snapshot(source) => source.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManifestDocument {
    document: DocumentMut,
    namespace: String,
    origin: Origin,
    section: Option<HubSection>,
    mounts_dirty: bool,
}

impl ManifestDocument {
    fn parse(content: &str, namespace: &str, origin: Origin) -> HubResult<Self> {
        let described = origin.describe();
        let document = parse_document(content, &described)?;
        let section = read_hub_section(&document, namespace, &described)?;

        Ok(Self {
            document,
            namespace: namespace.to_string(),
            origin,
            section,
            mounts_dirty: false,
        })
    }

    /// Load a file-backed manifest
    pub fn load(path: impl AsRef<Path>, namespace: &str) -> HubResult<Self> {
        let path = path.as_ref();
        let content = read_manifest_file(path)?;
        let manifest = Self::parse(&content, namespace, Origin::File(path.to_path_buf()))?;
        debug!("Loaded manifest {:?}", path);
        Ok(manifest)
    }

    /// Read a local package's manifest as a read-only snapshot
    pub fn load_snapshot(path: impl AsRef<Path>, namespace: &str) -> HubResult<Self> {
        let path = path.as_ref();
        let content = read_manifest_file(path)?;
        Self::parse(
            &content,
            namespace,
            Origin::Snapshot(path.display().to_string()),
        )
    }

    /// Fetch a manifest over the hub transport as a read-only snapshot
    pub async fn from_remote<T: HubTransport>(
        url: &str,
        namespace: &str,
        transport: &T,
        token_env: &str,
    ) -> HubResult<Self> {
        let content = transport
            .fetch_text(url)
            .await
            .map_err(|e| HubError::fetch(e, token_env))?;

        Self::parse(
            &content,
            namespace,
            Origin::Snapshot(redact_query(url).to_string()),
        )
    }

    /// Write the document back to the file it was loaded from
    pub fn save(&mut self) -> HubResult<()> {
        let path = match &self.origin {
            Origin::File(path) => path.clone(),
            Origin::Snapshot(source) => {
                return Err(HubError::InvalidState(format!(
                    "Cannot save manifest {} that was not loaded from a file",
                    source
                )))
            }
        };

        if self.mounts_dirty {
            let mounts = self.list_mounts().clone();
            write_mounts(
                &mut self.document,
                &self.namespace,
                &mounts,
                &self.origin.describe(),
            )?;
        }

        fs::write(&path, self.document.to_string()).map_err(|e| HubError::io(&path, e))?;
        self.mounts_dirty = false;

        info!("Saved manifest {:?}", path);
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Snapshot(_) => None,
        }
    }

    /// Dotted key of the hub section, e.g. `tool.langserve`
    pub fn section_key(&self) -> String {
        format!("tool.{}", self.namespace)
    }

    pub fn is_hub_compatible(&self) -> bool {
        self.section.is_some()
    }

    /// Mount `entry` at `path`, overwriting any existing mount there
    pub fn add_mount(&mut self, path: &str, entry: EntryPoint) -> HubResult<Option<EntryPoint>> {
        let previous = self
            .section
            .get_or_insert_with(HubSection::default)
            .paths
            .upsert(path, entry)?;
        self.mounts_dirty = true;
        Ok(previous)
    }

    pub fn remove_mount(&mut self, path: &str) -> HubResult<EntryPoint> {
        let section = self
            .section
            .as_mut()
            .ok_or_else(|| HubError::MountNotFound(path.to_string()))?;
        let removed = section.paths.remove(path)?;
        self.mounts_dirty = true;
        Ok(removed)
    }

    pub fn list_mounts(&self) -> &MountTable {
        self.section
            .as_ref()
            .map(|section| &section.paths)
            .unwrap_or(&EMPTY_MOUNTS)
    }

    /// Export declaration of this package
    pub fn export(&self) -> HubResult<EntryPoint> {
        let section = self.section.as_ref();

        let module = section
            .and_then(|s| s.export_module.clone())
            .ok_or_else(|| HubError::MissingExport {
                what: "module name",
                key: format!("{}.{}", self.section_key(), EXPORT_MODULE_KEY),
            })?;
        let attr = section
            .and_then(|s| s.export_attr.clone())
            .ok_or_else(|| HubError::MissingExport {
                what: "attr name",
                key: format!("{}.{}", self.section_key(), EXPORT_ATTR_KEY),
            })?;

        Ok(EntryPoint::new(module, attr))
    }
}
