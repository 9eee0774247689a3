//! Gemini REST backend implementation.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use tutor_core::{
    defaults, CardImage, EmbeddingBackend, EmbeddingTask, Error, GenerationBackend,
    InferenceBackend, Result, Vector,
};

use super::error::{to_tutor_error, GeminiErrorCode, GeminiOperation};
use super::types::*;
use crate::vision::VisionBackend;

/// Default Gemini API endpoint.
pub const DEFAULT_GEMINI_URL: &str = defaults::GEMINI_URL;

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = defaults::EMBED_MODEL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::GEN_MODEL;

/// Default embedding dimension for text-embedding-004.
pub const DEFAULT_DIMENSION: usize = defaults::EMBED_DIMENSION;

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the API endpoint (up to and including the version).
    pub base_url: String,
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for answer generation.
    pub gen_model: String,
    /// Model to use for image transcription.
    pub vision_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Timeout for embedding requests in seconds.
    pub embed_timeout_secs: u64,
    /// Timeout for generation and vision requests in seconds.
    pub gen_timeout_secs: u64,
}

impl GeminiConfig {
    /// Config with default models for the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_string(),
            api_key: api_key.into(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            vision_model: DEFAULT_GEN_MODEL.to_string(),
            embed_dimension: DEFAULT_DIMENSION,
            embed_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
            gen_timeout_secs: defaults::GEN_TIMEOUT_SECS,
        }
    }

    /// Load from environment variables.
    ///
    /// `GOOGLE_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(defaults::ENV_GOOGLE_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} is not set", defaults::ENV_GOOGLE_API_KEY))
            })?;

        let gen_model =
            std::env::var("GEMINI_GEN_MODEL").unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string());

        Ok(Self {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            api_key,
            embed_model: std::env::var("GEMINI_EMBED_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string()),
            vision_model: std::env::var("GEMINI_VISION_MODEL").unwrap_or_else(|_| gen_model.clone()),
            gen_model,
            embed_dimension: std::env::var("GEMINI_EMBED_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DIMENSION),
            embed_timeout_secs: std::env::var("GEMINI_EMBED_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::EMBED_TIMEOUT_SECS),
            gen_timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::GEN_TIMEOUT_SECS),
        })
    }
}

/// Gemini backend for embeddings, generation and image transcription.
///
/// Holds a pooled `reqwest::Client`; cheap to share behind an `Arc`.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gen_timeout_secs))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "gemini",
            "Initializing Gemini backend: url={}, embed={}, gen={}, vision={}",
            config.base_url,
            config.embed_model,
            config.gen_model,
            config.vision_model
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Accept both `gemini-1.5-flash` and `models/gemini-1.5-flash`.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    /// Build an authenticated POST to `{base}/models/{model}:{method}`.
    fn build_request(&self, model: &str, method: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            Self::model_path(model),
            method
        );
        self.client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
    }

    /// Turn a non-2xx response into a tutor Error.
    async fn error_from_response(
        response: reqwest::Response,
        operation: GeminiOperation,
    ) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (error_status, message) = match serde_json::from_str::<GeminiErrorResponse>(&body) {
            Ok(parsed) => (parsed.error.status, parsed.error.message),
            Err(_) => (String::new(), body),
        };
        let code = GeminiErrorCode::from_response(status.as_u16(), &error_status);
        to_tutor_error(
            code,
            operation,
            &format!("Gemini returned {}: {}", status, message),
        )
    }

    /// Shared `generateContent` call used by generation and vision.
    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        operation: GeminiOperation,
    ) -> Result<String> {
        let start = Instant::now();
        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
        };

        let response = self
            .build_request(model, "generateContent")
            .timeout(Duration::from_secs(self.config.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Gemini {}: {}", operation.as_str(), e))
                } else {
                    operation.error(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, operation).await);
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| operation.error(format!("Failed to parse response: {}", e)))?;

        let text = match result.text() {
            Some(text) => text,
            None => {
                let reason = result.block_reason().unwrap_or("empty response");
                return Err(operation.error(format!("No text returned ({})", reason)));
            }
        };

        debug!(
            component = "gemini",
            op = operation.as_str(),
            model = model,
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generateContent complete"
        );
        Ok(text)
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiBackend {
    async fn embed_texts(&self, texts: &[String], task: EmbeddingTask) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let model = Self::model_path(&self.config.embed_model);
        let to_request = |text: &String| EmbedContentRequest {
            model: model.clone(),
            content: Content {
                role: None,
                parts: vec![Part::text(text.clone())],
            },
            task_type: Some(task),
        };

        let request = if texts.len() == 1 {
            self.build_request(&model, "embedContent")
                .json(&to_request(&texts[0]))
        } else {
            self.build_request(&model, "batchEmbedContents")
                .json(&BatchEmbedContentsRequest {
                    requests: texts.iter().map(to_request).collect(),
                })
        };

        let response = request
            .timeout(Duration::from_secs(self.config.embed_timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Gemini embed: {}", e))
                } else {
                    Error::Embedding(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, GeminiOperation::Embed).await);
        }

        let vectors: Vec<Vector> = if texts.len() == 1 {
            let result: EmbedContentResponse = response
                .json()
                .await
                .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;
            vec![result.embedding.values]
        } else {
            let result: BatchEmbedContentsResponse = response
                .json()
                .await
                .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;
            result.embeddings.into_iter().map(|e| e.values).collect()
        };

        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        debug!(
            component = "gemini",
            op = "embed_texts",
            result_count = vectors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generated embeddings"
        );
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_images(prompt, &[]).await
    }

    async fn generate_with_images(&self, prompt: &str, images: &[CardImage]) -> Result<String> {
        debug!(
            component = "gemini",
            model = %self.config.gen_model,
            prompt_len = prompt.len(),
            image_count = images.len(),
            "Starting generation"
        );

        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(Part::text(prompt));
        for image in images {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&image.data);
            parts.push(Part::inline(image.mime_type.clone(), encoded));
        }

        self.generate_content(&self.config.gen_model, parts, GeminiOperation::Generate)
            .await
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl VisionBackend for GeminiBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_data);
        let parts = vec![Part::text(prompt), Part::inline(mime_type, encoded)];
        self.generate_content(&self.config.vision_model, parts, GeminiOperation::Describe)
            .await
    }

    fn model_name(&self) -> &str {
        &self.config.vision_model
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    async fn health_check(&self) -> Result<bool> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            Self::model_path(&self.config.gen_model)
        );
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("Gemini health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!("Gemini health check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Gemini health check error: {}", e);
                Ok(false)
            }
        }
    }
}
