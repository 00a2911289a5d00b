use thiserror::Error;

/// Errors raised while talking to the hub over HTTP.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{url} not found")]
    NotFound { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{path} is not a directory")]
    NotADirectory { path: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Strip the query string from a URL before it ends up in logs or errors.
///
/// Manifest URLs may carry an access token as `?token=...`.
pub fn redact_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_query_strips_token() {
        let url = "https://raw.example.com/org/repo/main/pkg/pyproject.toml?token=secret";
        assert_eq!(
            redact_query(url),
            "https://raw.example.com/org/repo/main/pkg/pyproject.toml"
        );
    }

    #[test]
    fn test_redact_query_without_query() {
        assert_eq!(redact_query("https://example.com/a"), "https://example.com/a");
    }

    #[test]
    fn test_not_found_display() {
        let err = ProtocolError::NotFound { url: "https://example.com/x".into() };
        assert_eq!(err.to_string(), "https://example.com/x not found");
    }
}
