//! # tutor-api
//!
//! HTTP surface of anki-tutor: the answering pipeline, citation footer,
//! error mapping and the axum router.

pub mod citations;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use tutor_core::logging;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub use config::{ImageStrategy, ServerConfig, TutorConfig};
pub use error::ApiError;
pub use pipeline::TutorPipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TutorPipeline>,
}

impl AppState {
    pub fn new(pipeline: TutorPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "anki-tutor API",
        description = "Retrieval-augmented tutor for Anki study cards"
    ),
    paths(handlers::ask::ask, handlers::ask::liveness, handlers::ask::health_check),
    components(schemas(handlers::AskRequest, handlers::AskResponse)),
    tags(
        (name = "Tutor", description = "Card answering"),
        (name = "System", description = "Liveness and health")
    )
)]
pub struct ApiDoc;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// CORS layer: allow-list when origins are configured, any origin otherwise
/// (the Anki add-on has no stable origin).
fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    match allowed_origins {
        Some(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!("Invalid CORS origin '{}': {}", o, e);
                        None
                    }
                })
                .collect();
            base.allow_origin(AllowOrigin::list(origins))
        }
        None => base.allow_origin(Any),
    }
}

/// Request span carrying the correlation id set by [`MakeRequestUuidV7`].
fn request_span<B>(request: &axum::http::Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        { logging::REQUEST_ID } = request_id,
    )
}

/// Build the application router with all middleware.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/health", get(handlers::health_check))
        .route("/ask", post(handlers::ask))
        .route("/perguntar", post(handlers::ask))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(server.allowed_origins.as_deref()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .with_state(state)
}
