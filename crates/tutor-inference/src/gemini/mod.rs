//! Google Gemini inference backend.
//!
//! Talks to the Generative Language REST API (`v1beta`) for three things:
//!
//! - query embeddings via `embedContent` / `batchEmbedContents`
//! - answer generation via `generateContent`
//! - image transcription via `generateContent` with an inline image part
//!
//! # Example
//!
//! ```rust,no_run
//! use tutor_inference::gemini::{GeminiBackend, GeminiConfig};
//! use tutor_core::{EmbeddingBackend, EmbeddingTask};
//!
//! #[tokio::main]
//! async fn main() {
//!     // From environment variables (GOOGLE_API_KEY is required)
//!     let backend = GeminiBackend::from_env().unwrap();
//!
//!     // Or with an explicit config
//!     let backend = GeminiBackend::new(GeminiConfig::new("my-key")).unwrap();
//!
//!     let texts = vec!["O que é federalismo?".to_string()];
//!     let vectors = backend
//!         .embed_texts(&texts, EmbeddingTask::RetrievalQuery)
//!         .await
//!         .unwrap();
//! }
//! ```

mod backend;
mod error;
pub mod types;

pub use backend::{
    GeminiBackend, GeminiConfig, DEFAULT_DIMENSION, DEFAULT_EMBED_MODEL, DEFAULT_GEMINI_URL,
    DEFAULT_GEN_MODEL,
};
pub use error::{GeminiErrorCode, GeminiOperation};
