//! Hub HTTP Client
//!
//! Fetches raw files and directory listings from the hub repository.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::contents::{ContentEntry, Listing};
use crate::error::{redact_query, ProtocolError};
use crate::http::create_http_client_with_timeout;

/// Location of the hub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubEndpoint {
    pub api_base_url: String,
    pub raw_base_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl HubEndpoint {
    /// Raw-content URL for a file inside the repository
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            path.trim_start_matches('/')
        )
    }

    /// Contents API URL for a path inside the repository
    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            path.trim_matches('/')
        )
    }
}

/// Transport used to reach the hub.
///
/// `HubClient` is the HTTP implementation; tests substitute in-memory fakes.
#[allow(async_fn_in_trait)]
pub trait HubTransport {
    /// Fetch a document as text
    async fn fetch_text(&self, url: &str) -> Result<String, ProtocolError>;

    /// List the immediate entries of a repository directory
    async fn list_dir(&self, path: &str) -> Result<Vec<ContentEntry>, ProtocolError>;

    /// Fetch the content of a file entry
    async fn fetch_file(&self, entry: &ContentEntry) -> Result<Vec<u8>, ProtocolError>;
}

/// HTTP client for the hub repository
pub struct HubClient {
    client: Client,
    endpoint: HubEndpoint,
    access_token: Option<String>,
}

impl HubClient {
    pub fn new(
        endpoint: HubEndpoint,
        access_token: Option<String>,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProtocolError> {
        let client = create_http_client_with_timeout(user_agent, timeout_secs)?;
        Ok(Self {
            client,
            endpoint,
            access_token,
        })
    }

    pub fn endpoint(&self) -> &HubEndpoint {
        &self.endpoint
    }

    async fn send(&self, url: &str, builder: RequestBuilder) -> Result<Response, ProtocolError> {
        let shown = redact_query(url).to_string();
        debug!(url = %shown, "Sending hub request");

        let response = builder.send().await.map_err(|e| ProtocolError::Transport {
            url: shown.clone(),
            message: e.without_url().to_string(),
        })?;

        let status = response.status();
        debug!(url = %shown, %status, "Hub response");

        if status == StatusCode::NOT_FOUND {
            return Err(ProtocolError::NotFound { url: shown });
        }
        if !status.is_success() {
            return Err(ProtocolError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

impl HubTransport for HubClient {
    async fn fetch_text(&self, url: &str) -> Result<String, ProtocolError> {
        let response = self.send(url, self.client.get(url)).await?;
        response.text().await.map_err(|e| ProtocolError::Decode {
            url: redact_query(url).to_string(),
            message: e.without_url().to_string(),
        })
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<ContentEntry>, ProtocolError> {
        let url = self.endpoint.contents_url(path);

        let mut builder = self
            .client
            .get(&url)
            .query(&[("ref", self.endpoint.branch.as_str())])
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = self.send(&url, builder).await?;
        let body = response.text().await.map_err(|e| ProtocolError::Decode {
            url: url.clone(),
            message: e.without_url().to_string(),
        })?;

        let listing: Listing = serde_json::from_str(&body).map_err(|e| ProtocolError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        match listing {
            Listing::Directory(entries) => Ok(entries),
            Listing::File(_) => Err(ProtocolError::NotADirectory {
                path: path.to_string(),
            }),
        }
    }

    async fn fetch_file(&self, entry: &ContentEntry) -> Result<Vec<u8>, ProtocolError> {
        let url = entry
            .download_url
            .clone()
            .unwrap_or_else(|| self.endpoint.raw_url(&entry.path));

        let response = self.send(&url, self.client.get(&url)).await?;
        let bytes = response.bytes().await.map_err(|e| ProtocolError::Decode {
            url: redact_query(&url).to_string(),
            message: e.without_url().to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> HubEndpoint {
        HubEndpoint {
            api_base_url: "https://api.github.com/".into(),
            raw_base_url: "https://raw.githubusercontent.com".into(),
            owner: "langchain-ai".into(),
            repo: "langserve-hub".into(),
            branch: "main".into(),
        }
    }

    #[test]
    fn test_raw_url() {
        assert_eq!(
            endpoint().raw_url("/simple/pirate/pyproject.toml"),
            "https://raw.githubusercontent.com/langchain-ai/langserve-hub/main/simple/pirate/pyproject.toml"
        );
    }

    #[test]
    fn test_contents_url_trims_slashes() {
        assert_eq!(
            endpoint().contents_url("/simple/pirate/"),
            "https://api.github.com/repos/langchain-ai/langserve-hub/contents/simple/pirate"
        );
    }

    #[test]
    fn test_client_builds() {
        let client = HubClient::new(endpoint(), None, "servehub-test", 5).unwrap();
        assert_eq!(client.endpoint().branch, "main");
    }
}
