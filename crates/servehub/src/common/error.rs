//! Common Error Types
//!
//! Unified error handling with process exit code mapping.

use std::path::PathBuf;

use servehub_protocol::ProtocolError;

/// Errors surfaced by servehub operations
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {origin}: {message}")]
    Format { origin: String, message: String },

    #[error("Failed to fetch {url}: {reason}. {hint}")]
    Fetch {
        url: String,
        reason: String,
        hint: String,
    },

    #[error("No {what} was exported at `{key}`")]
    MissingExport { what: &'static str, key: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Package {package} does not have a `{section}` section in its manifest")]
    IncompatiblePackage { package: String, section: String },

    #[error("No package is mounted at {0}")]
    MountNotFound(String),

    #[error("Invalid mount path {0:?}: mount paths must start with '/'")]
    InvalidMountPath(String),

    #[error("Remote path not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Installer command `{command}` failed: {reason}")]
    Install { command: String, reason: String },

    #[error("Serve runtime `{command}` failed: {reason}")]
    Serve { command: String, reason: String },
}

const NETWORK_HINT: &str = "Check your network connection";
const UNEXPECTED_HINT: &str = "The hub returned an unexpected response";

impl HubError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HubError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(origin: impl Into<String>, message: impl Into<String>) -> Self {
        HubError::Format {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Map a failed manifest fetch, attaching the remediation hint.
    /// Only HTTP rejections point at the access token.
    pub fn fetch(err: ProtocolError, token_env: &str) -> Self {
        let token_hint = || format!("Consider updating your {}", token_env);
        let (url, reason, hint) = match err {
            ProtocolError::NotFound { url } => (url, "HTTP 404".to_string(), token_hint()),
            ProtocolError::Status { url, status } => (url, format!("HTTP {}", status), token_hint()),
            ProtocolError::Transport { url, message } => {
                (url, message, NETWORK_HINT.to_string())
            }
            ProtocolError::Decode { url, message } => {
                (url, message, UNEXPECTED_HINT.to_string())
            }
            ProtocolError::NotADirectory { path } => {
                (path, "not a file".to_string(), UNEXPECTED_HINT.to_string())
            }
        };
        HubError::Fetch { url, reason, hint }
    }

    /// Map a failed download request for `path`
    pub fn download(err: ProtocolError, path: &str) -> Self {
        match err {
            ProtocolError::NotFound { .. } => HubError::NotFound(path.to_string()),
            ProtocolError::NotADirectory { path } => {
                HubError::NotFound(format!("{} (not a directory)", path))
            }
            other => HubError::Fetch {
                url: path.to_string(),
                reason: other.to_string(),
                hint: format!("Check the package name. {}", NETWORK_HINT),
            },
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            HubError::Io { .. } => 74,
            HubError::Format { .. } => 65,
            HubError::Fetch { .. } | HubError::NotFound(_) => 69,
            HubError::MissingExport { .. }
            | HubError::InvalidSettings(_)
            | HubError::IncompatiblePackage { .. } => 78,
            HubError::MountNotFound(_) | HubError::InvalidMountPath(_) => 64,
            HubError::InvalidState(_) => 70,
            HubError::Install { .. } | HubError::Serve { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_hint() {
        let err = HubError::fetch(
            ProtocolError::Status {
                url: "https://raw.example.com/pkg/pyproject.toml".into(),
                status: 403,
            },
            "GITHUB_TOKEN",
        );
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.ends_with("Consider updating your GITHUB_TOKEN"));
    }

    #[test]
    fn test_transport_error_does_not_blame_token() {
        let err = HubError::fetch(
            ProtocolError::Transport {
                url: "https://raw.example.com/pkg/pyproject.toml".into(),
                message: "dns error: failed to lookup address".into(),
            },
            "GITHUB_TOKEN",
        );
        let msg = err.to_string();
        assert!(!msg.contains("GITHUB_TOKEN"));
        assert!(msg.ends_with("Check your network connection"));
    }

    #[test]
    fn test_not_found_fetch_suggests_token() {
        let err = HubError::fetch(
            ProtocolError::NotFound { url: "https://raw.example.com/private/pyproject.toml".into() },
            "HUB_TOKEN",
        );
        assert!(matches!(err, HubError::Fetch { ref hint, .. } if hint == "Consider updating your HUB_TOKEN"));
    }

    #[test]
    fn test_download_not_found_maps_to_not_found() {
        let err = HubError::download(
            ProtocolError::NotFound { url: "https://api.example.com/x".into() },
            "simple/missing",
        );
        assert!(matches!(err, HubError::NotFound(ref p) if p == "simple/missing"));
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn test_missing_export_names_key() {
        let err = HubError::MissingExport {
            what: "attr name",
            key: "tool.langserve.export_attr".into(),
        };
        assert_eq!(
            err.to_string(),
            "No attr name was exported at `tool.langserve.export_attr`"
        );
    }
}
