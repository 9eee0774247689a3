//! HTTP error mapping.
//!
//! User-facing text and log detail are kept apart: a 500 body carries a
//! fixed message unless detail exposure is switched on, while the full
//! error is always logged.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;
use tutor_core::defaults;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client sent something unusable; message is returned verbatim.
    #[error("{0}")]
    BadRequest(String),
    /// Pipeline failure.
    #[error("{source}")]
    Internal {
        source: tutor_core::Error,
        expose_details: bool,
    },
}

impl ApiError {
    /// Map a pipeline error to an HTTP error.
    pub fn from_pipeline(err: tutor_core::Error, expose_details: bool) -> Self {
        if err.is_client_error() {
            let message = match err {
                tutor_core::Error::InvalidInput(msg) => msg,
                other => other.to_string(),
            };
            return ApiError::BadRequest(message);
        }
        ApiError::Internal {
            source: err,
            expose_details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Internal {
                source,
                expose_details,
            } => {
                error!(subsystem = "api", error = %source, "Request failed");
                if expose_details {
                    format!("Erro interno: {}", source)
                } else {
                    defaults::INTERNAL_ERROR_MESSAGE.to_string()
                }
            }
        };

        (status, Json(serde_json::json!({ "text": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::Error;

    #[test]
    fn test_invalid_input_is_bad_request() {
        let err = ApiError::from_pipeline(Error::InvalidInput("Erro: Card vazio.".into()), false);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Erro: Card vazio.");
    }

    #[test]
    fn test_upstream_failure_is_internal() {
        for err in [
            Error::Embedding("x".into()),
            Error::VectorIndex("x".into()),
            Error::Inference("x".into()),
            Error::Timeout("x".into()),
            Error::Cancelled("x".into()),
        ] {
            assert_eq!(
                ApiError::from_pipeline(err, false).status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn test_internal_response_status() {
        let response =
            ApiError::from_pipeline(Error::Inference("quota".into()), false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
