//! # tutor-search
//!
//! Retrieval half of anki-tutor.
//!
//! This crate provides:
//! - Query composition from card text and image transcription
//! - Semantic retrieval (embed, then nearest-neighbour lookup)
//! - Context assembly with source deduplication
//! - Pinecone vector index client
//!
//! ## Example
//!
//! ```ignore
//! use tutor_search::{compose, assemble, Retriever, PineconeIndex};
//!
//! let index = Arc::new(PineconeIndex::from_env().await?);
//! let retriever = Retriever::new(embedder, index);
//!
//! let context = match compose(&card.text, None, QUERY_CHAR_CAP) {
//!     Some(query) => assemble(retriever.retrieve(&query, &cancel).await?),
//!     None => RetrievedContext::empty(),
//! };
//! ```

pub mod context;
pub mod pinecone;
pub mod query;
pub mod retriever;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use tutor_core::*;

pub use context::assemble;
pub use pinecone::{PineconeConfig, PineconeIndex};
pub use query::compose;
pub use retriever::{Retriever, RetrieverConfig};
