//! Centralized default constants for anki-tutor.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. User-facing strings are in Portuguese because the Anki add-on
//! renders them verbatim to students.

// =============================================================================
// QUERY COMPOSITION
// =============================================================================

/// Hard cap, in characters, on the text sent to the embedding service.
pub const QUERY_CHAR_CAP: usize = 9000;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Number of nearest neighbours requested from the vector index.
pub const TOP_K: usize = 5;

/// Metadata field holding the snippet text of an index entry.
pub const METADATA_TEXT_FIELD: &str = "text";

/// Metadata field holding the source label of an index entry.
pub const METADATA_SOURCE_FIELD: &str = "source";

/// Source label used when an index entry carries no `source` metadata.
pub const UNKNOWN_SOURCE: &str = "Fonte Desconhecida";

/// Separator placed between retrieved snippets in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Context used when retrieval was skipped or returned nothing usable.
pub const NO_REFERENCE_CONTEXT: &str = "Sem referência nos PDFs (Card visual ou sem texto).";

/// Default vector index name.
pub const INDEX_NAME: &str = "anki-estudos";

// =============================================================================
// CITATIONS
// =============================================================================

/// Footer appended when no source was found.
pub const NO_SOURCES_FOOTER: &str = "\n\n<br><small><i>(Sem fontes nos PDFs)</i></small>";

/// Header of the citation footer.
pub const SOURCES_HEADER: &str = "\n\n<hr><b>📚 Fontes Consultadas:</b><br>";

// =============================================================================
// MODELS
// =============================================================================

/// Default Gemini API base URL.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
pub const EMBED_MODEL: &str = "text-embedding-004";

/// Embedding dimension for text-embedding-004.
pub const EMBED_DIMENSION: usize = 768;

/// Default generation model (also used for vision).
pub const GEN_MODEL: &str = "gemini-1.5-flash";

/// MIME type assumed for card images whose magic bytes are not recognised.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Pinecone control-plane URL used to resolve an index host.
pub const PINECONE_CONTROL_URL: &str = "https://api.pinecone.io";

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for generation and vision requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Timeout for vector index requests (seconds).
pub const INDEX_TIMEOUT_SECS: u64 = 15;

/// Pipeline-level budget for a single stage (seconds).
pub const STAGE_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 5000;

/// Maximum accepted request body (base64 images inflate payloads ~33%).
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Body returned by the liveness endpoint.
pub const LIVENESS_TEXT: &str = "Servidor Universal (Vision + RAG) Online 🟢";

/// Message returned for a card with neither text nor images.
pub const EMPTY_CARD_MESSAGE: &str = "Erro: Card vazio.";

/// Opaque message returned for unrecovered internal failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno ao gerar a resposta.";

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

/// Env var: API key for the Gemini embedding/generation service.
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

/// Env var: API key for the Pinecone vector index.
pub const ENV_PINECONE_API_KEY: &str = "PINECONE_API_KEY";

/// Env var: name of the Pinecone index.
pub const ENV_PINECONE_INDEX: &str = "PINECONE_INDEX";

/// Env var: data-plane host of the Pinecone index (skips control-plane lookup).
pub const ENV_PINECONE_INDEX_HOST: &str = "PINECONE_INDEX_HOST";
