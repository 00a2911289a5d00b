//! Package Identifier Resolution
//!
//! Maps a package identifier to the location of its manifest and to a source
//! location the installer understands. No I/O happens here.

use std::fmt;

use crate::config::Settings;

/// A package named on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageId {
    /// Starts with `.` or `/`; used as a filesystem path
    Local(String),
    /// Anything else; a subdirectory of the hub repository
    Hub(String),
}

impl PackageId {
    pub fn parse(id: &str) -> Self {
        if id.starts_with('.') || id.starts_with('/') {
            PackageId::Local(id.to_string())
        } else {
            PackageId::Hub(id.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PackageId::Local(id) | PackageId::Hub(id) => id,
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves package identifiers against a fixed hub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    manifest_file: String,
    git_host: String,
    raw_base_url: String,
    owner: String,
    repo: String,
    branch: String,
    access_token: Option<String>,
}

impl Resolver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            manifest_file: settings.manifest_file.clone(),
            git_host: settings.hub.git_host.clone(),
            raw_base_url: settings.hub.raw_base_url.trim_end_matches('/').to_string(),
            owner: settings.hub.owner.clone(),
            repo: settings.hub.repo.clone(),
            branch: settings.hub.branch.clone(),
            access_token: settings.access_token.clone().filter(|t| !t.is_empty()),
        }
    }

    /// Source location handed to the installer. Never carries the token.
    pub fn to_source_location(&self, id: &PackageId) -> String {
        match id {
            PackageId::Local(path) => path.clone(),
            PackageId::Hub(name) => format!(
                "git+https://{}/{}/{}.git#subdirectory={}",
                self.git_host, self.owner, self.repo, name
            ),
        }
    }

    /// Location of the package's manifest: a path for local packages, a raw
    /// content URL for hub packages.
    pub fn to_manifest_location(&self, id: &PackageId) -> String {
        match id {
            PackageId::Local(path) => format!("{}/{}", path, self.manifest_file),
            PackageId::Hub(name) => {
                let url = format!(
                    "{}/{}/{}/{}/{}/{}",
                    self.raw_base_url, self.owner, self.repo, self.branch, name, self.manifest_file
                );
                match &self.access_token {
                    Some(token) => format!("{}?token={}", url, urlencoding::encode(token)),
                    None => url,
                }
            }
        }
    }
}
