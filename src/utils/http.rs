//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client with sensible defaults
///
/// The request timeout configured here is the only time bound on a source;
/// the dispatcher never imposes its own.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a client from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a GET request and return the body of a successful response
    ///
    /// Transport failures map to [`SourceError::Network`], non-2xx statuses to
    /// [`SourceError::Api`].
    pub async fn get_text(&self, source: &str, request: RequestBuilder) -> Result<String, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to query {}: {}", source, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "{} API returned status: {}",
                source, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read {} response: {}", source, e)))
    }

    /// Like [`HttpClient::get_text`] but decodes the body as JSON
    pub async fn get_json(
        &self,
        source: &str,
        request: RequestBuilder,
    ) -> Result<serde_json::Value, SourceError> {
        let body = self.get_text(source, request).await?;
        serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("Failed to parse {} JSON: {}", source, e)))
    }
}
