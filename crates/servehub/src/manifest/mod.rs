//! Manifest System
//!
//! Loads, validates, edits and persists project manifests (`pyproject.toml`).

pub mod document;
pub mod loader;
pub mod types;

pub use document::ManifestDocument;
pub use loader::MAX_MANIFEST_BYTES;
pub use types::{EntryPoint, HubSection, Mount, MountTable};
