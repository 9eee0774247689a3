//! Core traits for the external services the pipeline depends on.
//!
//! Every implementation must be `Send + Sync` and free of per-request
//! mutable state: a single instance is shared by all in-flight requests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CardImage, EmbeddingTask, IndexMatch};

/// Dense embedding vector.
pub type Vector = Vec<f32>;

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String], task: EmbeddingTask) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text from a prompt with images attached as inline data.
    async fn generate_with_images(&self, prompt: &str, images: &[CardImage]) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Combined inference backend supporting both embedding and generation.
#[async_trait]
pub trait InferenceBackend: EmbeddingBackend + GenerationBackend {
    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// VECTOR INDEX TRAITS
// =============================================================================

/// Nearest-neighbour lookup against a pre-built index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches for `vector`, most relevant first.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>>;

    /// Name of the index being queried.
    fn index_name(&self) -> &str;
}
