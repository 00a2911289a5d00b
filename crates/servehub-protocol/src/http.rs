//! HTTP Client Utilities
//!
//! Shared HTTP client creation with consistent configuration.

use std::time::Duration;

use crate::ProtocolError;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Create a reqwest HTTP client
///
/// - `timeout_secs` request timeout, 10 second connect timeout
/// - `user_agent` is required by the GitHub API
pub fn create_http_client_with_timeout(
    user_agent: &str,
    timeout_secs: u64,
) -> Result<reqwest::Client, ProtocolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
        .map_err(|e| ProtocolError::Transport {
            url: String::new(),
            message: format!("Failed to build HTTP client: {}", e),
        })
}
