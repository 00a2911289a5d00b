//! servehub
//!
//! Resolve chain packages published on a hub repository, mount their exports
//! in a project manifest and mirror their sources locally.

pub mod common;
pub mod config;
pub mod download;
pub mod install;
pub mod manifest;
pub mod registration;
pub mod resolver;
pub mod serve;

pub use common::{HubError, HubResult};
pub use config::Settings;
pub use download::{DownloadSummary, TreeDownloader};
pub use install::{CommandInstaller, Installer};
pub use manifest::{EntryPoint, ManifestDocument, Mount, MountTable};
pub use registration::{Registrar, Registration};
pub use resolver::{PackageId, Resolver};
pub use serve::{MountRegistry, ProcessRuntime, ServeRuntime};
