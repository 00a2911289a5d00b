//! Hub Directory Listing Types
//!
//! Rust structs matching the repository contents API
//! (`GET /repos/{owner}/{repo}/contents/{path}`).

use serde::{Deserialize, Serialize};

/// Kind of a directory listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a remote directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ContentEntry {
    pub fn file(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::File,
            size,
            download_url: None,
        }
    }

    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Dir,
            size: 0,
            download_url: None,
        }
    }
}

/// Body of a contents API response.
///
/// A directory yields an array of entries, a file yields a single object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directory_listing() {
        let body = r#"[
            {"name": "pyproject.toml", "path": "simple/pirate/pyproject.toml", "type": "file",
             "size": 512, "download_url": "https://raw.example.com/simple/pirate/pyproject.toml"},
            {"name": "pirate", "path": "simple/pirate/pirate", "type": "dir", "size": 0,
             "download_url": null}
        ]"#;

        let listing: Listing = serde_json::from_str(body).unwrap();
        let Listing::Directory(entries) = listing else {
            panic!("expected a directory listing");
        };

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].size, 512);
        assert!(entries[0].download_url.is_some());
        assert_eq!(entries[1].kind, EntryKind::Dir);
        assert!(entries[1].download_url.is_none());
    }

    #[test]
    fn test_parse_file_listing() {
        let body = r#"{"name": "README.md", "path": "simple/README.md", "type": "file", "size": 3}"#;
        let listing: Listing = serde_json::from_str(body).unwrap();
        assert!(matches!(listing, Listing::File(entry) if entry.name == "README.md"));
    }

    #[test]
    fn test_unknown_kind_is_other() {
        let body = r#"[{"name": "x", "path": "x", "type": "weird"}]"#;
        let Listing::Directory(entries) = serde_json::from_str(body).unwrap() else {
            panic!("expected a directory listing");
        };
        assert_eq!(entries[0].kind, EntryKind::Other);
    }
}
