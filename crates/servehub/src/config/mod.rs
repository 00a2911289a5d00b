//! Configuration management
//!
//! Handles reading servehub settings from `~/.servehub/config.json` and the
//! access token from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use servehub_protocol::HubEndpoint;

use crate::common::{config_path, HubError, HubResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the `tool.<namespace>` manifest section
    pub namespace: String,
    /// Manifest file name inside a package
    pub manifest_file: String,
    pub hub: HubSettings,
    pub http: HttpSettings,
    /// Maximum number of in-flight requests while downloading a tree
    pub download_concurrency: usize,
    pub installer: InstallerSettings,
    pub serve: ServeSettings,
    /// Read from `hub.token_env` at load time, never from the settings file
    #[serde(skip)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub git_host: String,
    pub raw_base_url: String,
    pub api_base_url: String,
    /// Environment variable holding the access token
    pub token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    pub program: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSettings {
    /// Runtime command; the first element is the program
    pub command: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: "langserve".to_string(),
            manifest_file: "pyproject.toml".to_string(),
            hub: HubSettings::default(),
            http: HttpSettings::default(),
            download_concurrency: 8,
            installer: InstallerSettings::default(),
            serve: ServeSettings::default(),
            access_token: None,
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            owner: "langchain-ai".to_string(),
            repo: "langserve-hub".to_string(),
            branch: "main".to_string(),
            git_host: "github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: servehub_protocol::http::DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("servehub/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            program: "poetry".to_string(),
        }
    }
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            command: vec![
                "poetry".to_string(),
                "run".to_string(),
                "servehub-runtime".to_string(),
            ],
            host: "localhost".to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `~/.servehub/config.json` when no
    /// path is given. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> HubResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No settings file at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };

        settings.access_token = read_token(&settings.hub.token_env);
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> HubResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HubError::io(path, e))?;
        let settings = Self::from_json(&content)
            .map_err(|e| HubError::InvalidSettings(format!("{}: {}", path.display(), e)))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let settings: Settings = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse settings JSON: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        if self.namespace.trim().is_empty() {
            return Err("namespace cannot be empty".to_string());
        }
        if self.manifest_file.trim().is_empty() {
            return Err("manifest_file cannot be empty".to_string());
        }
        if self.serve.command.is_empty() {
            return Err("serve.command must name a program".to_string());
        }
        Ok(())
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Concurrency bound for the tree downloader, never below one
    pub fn download_limit(&self) -> usize {
        self.download_concurrency.max(1)
    }

    pub fn endpoint(&self) -> HubEndpoint {
        HubEndpoint {
            api_base_url: self.hub.api_base_url.clone(),
            raw_base_url: self.hub.raw_base_url.clone(),
            owner: self.hub.owner.clone(),
            repo: self.hub.repo.clone(),
            branch: self.hub.branch.clone(),
        }
    }
}

fn read_token(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|t| !t.is_empty())
}
