//! Pinecone vector index client.
//!
//! Only the data-plane `query` call is used at request time. The index host
//! is either configured directly or resolved once at startup through the
//! control plane (`GET /indexes/{name}`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tutor_core::{defaults, Error, IndexMatch, Result, VectorIndex};

/// API version pinned in every request.
pub const API_VERSION: &str = "2024-07";

/// Configuration for the Pinecone client.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    /// Index name, used for host resolution and logging.
    pub index_name: String,
    /// Data-plane host. Resolved from the control plane when `None`.
    pub index_host: Option<String>,
    /// Control-plane base URL.
    pub control_url: String,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            index_name: defaults::INDEX_NAME.to_string(),
            index_host: None,
            control_url: defaults::PINECONE_CONTROL_URL.to_string(),
            timeout_secs: defaults::INDEX_TIMEOUT_SECS,
        }
    }

    /// Load from environment variables. `PINECONE_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(defaults::ENV_PINECONE_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} is not set", defaults::ENV_PINECONE_API_KEY))
            })?;

        Ok(Self {
            api_key,
            index_name: std::env::var(defaults::ENV_PINECONE_INDEX)
                .unwrap_or_else(|_| defaults::INDEX_NAME.to_string()),
            index_host: std::env::var(defaults::ENV_PINECONE_INDEX_HOST)
                .ok()
                .filter(|h| !h.trim().is_empty()),
            control_url: std::env::var("PINECONE_CONTROL_URL")
                .unwrap_or_else(|_| defaults::PINECONE_CONTROL_URL.to_string()),
            timeout_secs: std::env::var("PINECONE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::INDEX_TIMEOUT_SECS),
        })
    }
}

/// Hosts from the control plane come without a scheme.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

/// Pinecone-backed [`VectorIndex`].
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    index_name: String,
    host: String,
}

impl PineconeIndex {
    /// Build the client, resolving the data-plane host if not configured.
    pub async fn connect(config: PineconeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::VectorIndex(format!("Failed to create HTTP client: {}", e)))?;

        let host = match &config.index_host {
            Some(host) => normalize_host(host),
            None => Self::resolve_host(&client, &config).await?,
        };

        info!(
            subsystem = "search",
            component = "pinecone",
            index = %config.index_name,
            host = %host,
            "Pinecone index ready"
        );

        Ok(Self {
            client,
            api_key: config.api_key,
            index_name: config.index_name,
            host,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> Result<Self> {
        Self::connect(PineconeConfig::from_env()?).await
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn resolve_host(client: &Client, config: &PineconeConfig) -> Result<String> {
        let url = format!(
            "{}/indexes/{}",
            config.control_url.trim_end_matches('/'),
            config.index_name
        );
        let response = client
            .get(&url)
            .header("Api-Key", &config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Config(format!(
                "Could not resolve Pinecone index '{}' ({}): {}",
                config.index_name, status, body
            )));
        }

        let described: DescribeIndexResponse = response
            .json()
            .await
            .map_err(|e| Error::VectorIndex(format!("Failed to parse index description: {}", e)))?;
        Ok(normalize_host(&described.host))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let start = Instant::now();
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Pinecone query: {}", e))
                } else {
                    Error::VectorIndex(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorIndex(format!(
                "Pinecone returned {}: {}",
                status, body
            )));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::VectorIndex(format!("Failed to parse response: {}", e)))?;

        debug!(
            component = "pinecone",
            op = "query",
            top_k,
            result_count = result.matches.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Index query complete"
        );
        Ok(result.matches)
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}
