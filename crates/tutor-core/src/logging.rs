//! Structured logging schema and field name constants for anki-tutor.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Fatal pipeline failure, request answered with 500 |
//! | WARN  | Recoverable issue, automatic fallback applied (e.g. transcription) |
//! | INFO  | Lifecycle events (startup, shutdown), request completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (index matches, snippets) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP layer. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "search", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "retriever", "transcriber", "gemini", "pinecone"
pub const COMPONENT: &str = "component";

/// Pipeline stage name.
/// Values: "transcription", "retrieval", "generation"
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of distinct sources cited.
pub const SOURCE_COUNT: &str = "source_count";

/// Character length of the composed retrieval query.
pub const QUERY_LEN: &str = "query_len";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of images on the card.
pub const IMAGE_COUNT: &str = "image_count";
