//! Mock inference backend for deterministic testing.
//!
//! Implements every inference trait (embedding, generation, vision) with
//! canned output and a call log, so pipeline tests can assert what was sent
//! upstream without network access.
//!
//! ## Usage
//!
//! ```rust
//! use tutor_inference::mock::MockInferenceBackend;
//!
//! let backend = MockInferenceBackend::new()
//!     .with_dimension(8)
//!     .with_fixed_response("Resposta do tutor")
//!     .with_transcription("Questão 1: ...");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tutor_core::{
    CardImage, EmbeddingBackend, EmbeddingTask, Error, GenerationBackend, InferenceBackend, Result,
    Vector,
};

use crate::vision::VisionBackend;

/// Mock inference backend for testing.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    fixed_responses: HashMap<String, String>,
    default_response: String,
    transcription: String,
    latency_ms: u64,
    fail_embed: bool,
    fail_generate: bool,
    fail_vision: bool,
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    /// Images attached to a generation call, or 1 for a vision call.
    pub image_count: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            fixed_responses: HashMap::new(),
            default_response: "Mock response".to_string(),
            transcription: String::new(),
            latency_ms: 0,
            fail_embed: false,
            fail_generate: false,
            fail_vision: false,
        }
    }
}

impl MockInferenceBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set a fixed response for generation requests.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Answer with `output` whenever the prompt contains `needle`.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(needle.into(), output.into());
        self
    }

    /// Raw text returned by `describe_image`.
    pub fn with_transcription(mut self, text: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).transcription = text.into();
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    pub fn with_embed_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_embed = true;
        self
    }

    pub fn with_generate_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_generate = true;
        self
    }

    pub fn with_vision_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_vision = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    /// Inputs of every call to `operation`, in order.
    pub fn inputs_for(&self, operation: &str) -> Vec<String> {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.input.clone())
            .collect()
    }

    /// Get number of embed calls.
    pub fn embed_call_count(&self) -> usize {
        self.inputs_for("embed").len()
    }

    /// Get number of generation calls.
    pub fn generate_call_count(&self) -> usize {
        self.inputs_for("generate").len()
    }

    /// Get number of vision calls.
    pub fn vision_call_count(&self) -> usize {
        self.inputs_for("describe_image").len()
    }

    fn log_call(&self, operation: &str, input: &str, image_count: usize) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
            image_count,
        });
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn response_for(&self, prompt: &str) -> String {
        self.config
            .fixed_responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_else(|| self.config.default_response.clone())
    }
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String], _task: EmbeddingTask) -> Result<Vec<Vector>> {
        for text in texts {
            self.log_call("embed", text, 0);
        }
        self.simulate_latency().await;

        if self.config.fail_embed {
            return Err(Error::Embedding("Simulated failure for testing".into()));
        }

        Ok(texts
            .iter()
            .map(|t| MockEmbeddingGenerator::generate(t, self.config.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_images(prompt, &[]).await
    }

    async fn generate_with_images(&self, prompt: &str, images: &[CardImage]) -> Result<String> {
        self.log_call("generate", prompt, images.len());
        self.simulate_latency().await;

        if self.config.fail_generate {
            return Err(Error::Inference("Simulated failure for testing".into()));
        }
        Ok(self.response_for(prompt))
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

#[async_trait]
impl VisionBackend for MockInferenceBackend {
    async fn describe_image(
        &self,
        _image_data: &[u8],
        mime_type: &str,
        _prompt: &str,
    ) -> Result<String> {
        self.log_call("describe_image", mime_type, 1);
        self.simulate_latency().await;

        if self.config.fail_vision {
            return Err(Error::Vision("Simulated failure for testing".into()));
        }
        Ok(self.config.transcription.clone())
    }

    fn model_name(&self) -> &str {
        "mock-vision"
    }
}

#[async_trait]
impl InferenceBackend for MockInferenceBackend {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Mock embedding generator with deterministic output.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic embedding from text.
    ///
    /// Uses character-based hashing for reproducibility. The same text
    /// will always produce the same embedding.
    pub fn generate(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension];
        if dimension == 0 {
            return vec;
        }

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }

        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        vec
    }
}
