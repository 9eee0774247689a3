//! Error types for anki-tutor.

use thiserror::Error;

/// Result type alias using anki-tutor's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for anki-tutor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Image transcription failed
    #[error("Vision error: {0}")]
    Vision(String),

    /// Vector index lookup failed
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// An external call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The request was abandoned before the stage completed
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by the caller rather than by an upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("failed to generate".to_string());
        assert_eq!(err.to_string(), "Embedding error: failed to generate");
    }

    #[test]
    fn test_error_display_inference() {
        let err = Error::Inference("quota exhausted".to_string());
        assert_eq!(err.to_string(), "Inference error: quota exhausted");
    }

    #[test]
    fn test_error_display_vision() {
        let err = Error::Vision("unreadable image".to_string());
        assert_eq!(err.to_string(), "Vision error: unreadable image");
    }

    #[test]
    fn test_error_display_vector_index() {
        let err = Error::VectorIndex("index unavailable".to_string());
        assert_eq!(err.to_string(), "Vector index error: index unavailable");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing API key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty card".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty card");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("generation after 60s".to_string());
        assert_eq!(err.to_string(), "Timed out: generation after 60s");
    }

    #[test]
    fn test_error_display_cancelled() {
        let err = Error::Cancelled("retrieval".to_string());
        assert_eq!(err.to_string(), "Cancelled: retrieval");
    }

    #[test]
    fn test_only_invalid_input_is_client_error() {
        assert!(Error::InvalidInput("x".into()).is_client_error());
        assert!(!Error::Inference("x".into()).is_client_error());
        assert!(!Error::Timeout("x".into()).is_client_error());
        assert!(!Error::VectorIndex("x".into()).is_client_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::VectorIndex("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("VectorIndex"));
    }
}
