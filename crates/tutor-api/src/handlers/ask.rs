//! Study-card HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use utoipa::ToSchema;

use tutor_core::{defaults, CardImage, StudyCard};

use crate::{ApiError, AppState};

/// Request body for asking about a card.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AskRequest {
    /// Text typed on the card.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Base64-encoded card images (JPEG from the Anki add-on).
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Tutor answer, or an error message on failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AskResponse {
    pub text: String,
}

/// Accepts raw base64 or a `data:image/...;base64,` URI.
fn decode_image(encoded: &str) -> Result<CardImage, ApiError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("Imagem inválida (base64): {}", e)))?;
    Ok(CardImage::from_bytes(bytes))
}

impl AskRequest {
    /// Decode into a card. Blank image entries are dropped.
    pub fn into_card(self) -> Result<StudyCard, ApiError> {
        let images = self
            .images
            .unwrap_or_default()
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| decode_image(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StudyCard::new(self.prompt.unwrap_or_default(), images))
    }
}

/// Answer a study card.
///
/// Retrieves excerpts related to the card, asks the model for a short
/// lesson and appends the consulted sources.
#[utoipa::path(post, path = "/ask", tag = "Tutor",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer with source footer", body = AskResponse),
        (status = 400, description = "Empty card, undecodable image or malformed body", body = AskResponse),
        (status = 500, description = "Upstream failure", body = AskResponse),
    ))]
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    // Body errors use the same `{ "text": ... }` envelope as every other reply.
    let Json(req) = payload
        .map_err(|e| ApiError::BadRequest(format!("Requisição inválida: {}", e.body_text())))?;
    let card = req.into_card()?;
    debug!(
        text_len = card.text.len(),
        image_count = card.images.len(),
        "Card received"
    );

    // Dropping the handler future (client gone) cancels in-flight calls.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let expose = state.pipeline.config().expose_error_details;
    let response = state
        .pipeline
        .answer(&card, &cancel)
        .await
        .map_err(|e| ApiError::from_pipeline(e, expose))?;

    Ok(Json(AskResponse {
        text: response.text,
    }))
}

/// Liveness probe used by the Anki add-on.
#[utoipa::path(get, path = "/", tag = "System",
    responses((status = 200, description = "Server is up", body = String)))]
pub async fn liveness() -> &'static str {
    defaults::LIVENESS_TEXT
}

/// Health check with version.
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Server is healthy")))]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
