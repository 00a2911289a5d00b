//! Manifest Loader
//!
//! Reads manifest files, parses TOML and extracts the typed hub section.
//! Writes the mount table back into the document without disturbing the rest
//! of its formatting.

use std::fs;
use std::path::Path;
use toml_edit::{Array, DocumentMut, Item, Table, TableLike, Value};
use tracing::debug;

use super::types::{validate_mount_path, EntryPoint, HubSection, MountTable};
use crate::common::{HubError, HubResult};

/// Largest manifest accepted from disk (1MB)
pub const MAX_MANIFEST_BYTES: u64 = 1_000_000;

pub const PATHS_KEY: &str = "paths";
pub const EXPORT_MODULE_KEY: &str = "export_module";
pub const EXPORT_ATTR_KEY: &str = "export_attr";

pub fn read_manifest_file(path: &Path) -> HubResult<String> {
    let metadata = fs::metadata(path).map_err(|e| HubError::io(path, e))?;
    if metadata.len() > MAX_MANIFEST_BYTES {
        return Err(HubError::format(
            path.display().to_string(),
            "Manifest file too large (max 1MB)",
        ));
    }

    fs::read_to_string(path).map_err(|e| HubError::io(path, e))
}

pub fn parse_document(content: &str, origin: &str) -> HubResult<DocumentMut> {
    content
        .parse::<DocumentMut>()
        .map_err(|e| HubError::format(origin, format!("Failed to parse TOML: {}", e)))
}

/// Extract and validate `tool.<namespace>`. `None` when the section is absent.
pub fn read_hub_section(
    document: &DocumentMut,
    namespace: &str,
    origin: &str,
) -> HubResult<Option<HubSection>> {
    let Some(tool) = document.get("tool") else {
        return Ok(None);
    };
    let tool = tool
        .as_table_like()
        .ok_or_else(|| HubError::format(origin, "`tool` must be a table"))?;

    let Some(section) = tool.get(namespace) else {
        return Ok(None);
    };
    let key = format!("tool.{}", namespace);
    let section = section
        .as_table_like()
        .ok_or_else(|| HubError::format(origin, format!("`{}` must be a table", key)))?;

    let paths = match section.get(PATHS_KEY) {
        Some(item) => read_paths(item, &format!("{}.{}", key, PATHS_KEY), origin)?,
        None => MountTable::new(),
    };

    let export_module = read_optional_str(section, EXPORT_MODULE_KEY, &key, origin)?;
    let export_attr = read_optional_str(section, EXPORT_ATTR_KEY, &key, origin)?;

    debug!(
        "Read `{}` from {}: {} mounts, export {:?}:{:?}",
        key,
        origin,
        paths.len(),
        export_module,
        export_attr
    );

    Ok(Some(HubSection {
        paths,
        export_module,
        export_attr,
    }))
}

fn read_paths(item: &Item, key: &str, origin: &str) -> HubResult<MountTable> {
    let table = item
        .as_table_like()
        .ok_or_else(|| HubError::format(origin, format!("`{}` must be a table", key)))?;

    let mut mounts = MountTable::new();
    for (path, value) in table.iter() {
        validate_mount_path(path).map_err(|_| {
            HubError::format(
                origin,
                format!("`{}` key {:?} must start with '/'", key, path),
            )
        })?;

        let entry = read_entry_point(value).ok_or_else(|| {
            HubError::format(
                origin,
                format!(
                    "`{}.\"{}\"` must be a [module, attr] pair of strings",
                    key, path
                ),
            )
        })?;
        mounts.upsert(path, entry)?;
    }

    Ok(mounts)
}

fn read_entry_point(item: &Item) -> Option<EntryPoint> {
    let array = item.as_array()?;
    if array.len() != 2 {
        return None;
    }
    let module = array.get(0)?.as_str()?;
    let attr = array.get(1)?.as_str()?;
    Some(EntryPoint::new(module, attr))
}

fn read_optional_str(
    section: &dyn TableLike,
    name: &str,
    section_key: &str,
    origin: &str,
) -> HubResult<Option<String>> {
    match section.get(name) {
        None => Ok(None),
        Some(item) => item.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            HubError::format(
                origin,
                format!("`{}.{}` must be a string", section_key, name),
            )
        }),
    }
}

/// Write `mounts` into `tool.<namespace>.paths`, creating tables as needed.
///
/// Existing keys keep their position, stale keys are removed and new keys are
/// appended.
pub fn write_mounts(
    document: &mut DocumentMut,
    namespace: &str,
    mounts: &MountTable,
    origin: &str,
) -> HubResult<()> {
    let key = format!("tool.{}.{}", namespace, PATHS_KEY);
    let paths = get_or_insert_nested_table(document, &["tool", namespace, PATHS_KEY])
        .ok_or_else(|| HubError::format(origin, format!("`{}` is not a table", key)))?;

    let stale: Vec<String> = paths
        .iter()
        .map(|(path, _)| path.to_string())
        .filter(|path| !mounts.contains(path))
        .collect();
    for path in stale {
        paths.remove(&path);
    }

    for mount in mounts {
        let mut pair = Array::new();
        pair.push(mount.entry.module.as_str());
        pair.push(mount.entry.attr.as_str());
        paths.insert(&mount.path, Item::Value(Value::Array(pair)));
    }

    Ok(())
}

fn get_or_insert_nested_table<'a>(
    document: &'a mut DocumentMut,
    parts: &[&str],
) -> Option<&'a mut dyn TableLike> {
    let mut current = document.as_table_mut() as &mut dyn TableLike;

    for part in parts {
        let created = !current.contains_key(part);
        let item = current.entry(part).or_insert(Item::Table(Table::new()));
        if created {
            if let Some(table) = item.as_table_mut() {
                // Avoid emitting empty parent headers like `[tool]`
                table.set_implicit(true);
            }
        }
        current = item.as_table_like_mut()?;
    }

    Some(current)
}
