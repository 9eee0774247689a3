//! Gemini-specific error handling.

use tutor_core::Error;

/// Gemini error classes, derived from HTTP status and the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiErrorCode {
    /// API key missing, invalid or lacking permission.
    PermissionDenied,
    /// Quota or rate limit exhausted.
    ResourceExhausted,
    /// Model not found or not available.
    ModelNotFound,
    /// Malformed request (bad payload, unsupported image).
    InvalidArgument,
    /// Upstream deadline exceeded.
    DeadlineExceeded,
    /// Server error or temporary unavailability.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl GeminiErrorCode {
    /// Determine error code from HTTP status and error status string.
    pub fn from_response(status: u16, error_status: &str) -> Self {
        match (status, error_status) {
            (401 | 403, _) | (_, "PERMISSION_DENIED" | "UNAUTHENTICATED") => {
                Self::PermissionDenied
            }
            (429, _) | (_, "RESOURCE_EXHAUSTED") => Self::ResourceExhausted,
            (404, _) | (_, "NOT_FOUND") => Self::ModelNotFound,
            (504, _) | (_, "DEADLINE_EXCEEDED") => Self::DeadlineExceeded,
            (400, _) | (_, "INVALID_ARGUMENT" | "FAILED_PRECONDITION") => Self::InvalidArgument,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Which Gemini call failed; decides the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiOperation {
    Embed,
    Generate,
    Describe,
}

impl GeminiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeminiOperation::Embed => "embed",
            GeminiOperation::Generate => "generate",
            GeminiOperation::Describe => "describe_image",
        }
    }

    /// Wrap a message in the error variant owned by this operation.
    pub fn error(&self, message: String) -> Error {
        match self {
            GeminiOperation::Embed => Error::Embedding(message),
            GeminiOperation::Generate => Error::Inference(message),
            GeminiOperation::Describe => Error::Vision(message),
        }
    }
}

/// Convert a Gemini error to a tutor Error.
pub fn to_tutor_error(code: GeminiErrorCode, operation: GeminiOperation, message: &str) -> Error {
    match code {
        GeminiErrorCode::PermissionDenied => {
            Error::Config(format!("Gemini authentication failed: {}", message))
        }
        GeminiErrorCode::ModelNotFound => {
            Error::Config(format!("Gemini model not found: {}", message))
        }
        GeminiErrorCode::DeadlineExceeded => {
            Error::Timeout(format!("Gemini {}: {}", operation.as_str(), message))
        }
        GeminiErrorCode::ResourceExhausted => {
            operation.error(format!("Quota exceeded: {}", message))
        }
        GeminiErrorCode::InvalidArgument => {
            operation.error(format!("Invalid request: {}", message))
        }
        GeminiErrorCode::ServerError => operation.error(format!("Server error: {}", message)),
        GeminiErrorCode::Unknown => operation.error(message.to_string()),
    }
}
