//! # tutor-inference
//!
//! Model-facing half of anki-tutor.
//!
//! This crate provides:
//! - Gemini backend for query embeddings, answer generation and image reading
//! - Vision backend trait and the card-image transcriber
//! - Tutor prompt construction from a subject-profile table
//! - Mock backend for deterministic tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use tutor_inference::{GeminiBackend, PromptBuilder, PromptInput};
//! use tutor_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = GeminiBackend::from_env().unwrap();
//!     let prompt = PromptBuilder::default().build(&PromptInput {
//!         card_text: "O que é federalismo?",
//!         transcription: None,
//!         context: "Sem referência nos PDFs (Card visual ou sem texto).",
//!         images_attached: false,
//!     });
//!     let answer = backend.generate(&prompt).await.unwrap();
//! }
//! ```

pub mod gemini;
pub mod prompt;
pub mod vision;

// Mock inference backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use tutor_core::*;

pub use gemini::{GeminiBackend, GeminiConfig};
pub use prompt::{default_profile_guides, ProfileGuide, PromptBuilder, PromptInput};
pub use vision::{parse_transcription, VisionBackend, VisualTranscriber, TRANSCRIPTION_PROMPT};
