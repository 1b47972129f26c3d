//! HTTP client wrapper for cloud API requests.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::provider::CloudProvider;

/// Default timeout for a single API request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default EC2 Query API endpoint.
pub const DEFAULT_EC2_ENDPOINT: &str = "https://ec2.us-east-1.amazonaws.com";

/// Default Azure Resource Manager endpoint.
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// HTTP client wrapper shared by the provider wire layers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl ApiClient {
    /// Create a new API client with the specified timeout and base URL.
    pub fn new(timeout: Duration, base_url: &str) -> Result<Self, reqwest::Error> {
        let inner = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(false)
            .build()?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
        })
    }

    /// Create a client for the provider's default endpoint.
    pub fn for_provider(provider: CloudProvider) -> Result<Self, reqwest::Error> {
        let endpoint = provider.default_endpoint();
        debug!(%provider, endpoint, "using default endpoint");
        Self::new(DEFAULT_TIMEOUT, endpoint)
    }

    /// Create a client with the default timeout and a custom base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, reqwest::Error> {
        Self::new(DEFAULT_TIMEOUT, base_url)
    }

    /// Attach a bearer token sent with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add the configured credentials, if any, to a request.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
    }

    #[test]
    fn test_client_for_provider() {
        let client = ApiClient::for_provider(CloudProvider::Aws).unwrap();
        assert_eq!(client.base_url(), DEFAULT_EC2_ENDPOINT);

        let client = ApiClient::for_provider(CloudProvider::Azure).unwrap();
        assert_eq!(client.base_url(), DEFAULT_ARM_ENDPOINT);
    }

    #[test]
    fn test_client_custom_base_url() {
        let client = ApiClient::with_base_url("http://localhost:8080").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = ApiClient::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_authorize_adds_bearer_header() {
        let client = ApiClient::with_base_url("http://localhost:8080")
            .unwrap()
            .with_bearer_token("secret");
        let request = client
            .authorize(client.inner().get("http://localhost:8080/"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer secret"
        );
    }

    #[test]
    fn test_authorize_without_token() {
        let client = ApiClient::with_base_url("http://localhost:8080").unwrap();
        let request = client
            .authorize(client.inner().get("http://localhost:8080/"))
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());
    }
}
