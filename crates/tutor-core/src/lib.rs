//! # tutor-core
//!
//! Core types, traits, and abstractions for anki-tutor.
//!
//! This crate provides the request-scoped data model of the study-card
//! pipeline and the traits behind which the external embedding, generation
//! and vector index services are injected.

pub mod deadline;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use deadline::run_bounded;
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
