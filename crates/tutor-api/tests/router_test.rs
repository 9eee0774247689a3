//! HTTP-level tests for the axum router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tutor_api::{build_router, AppState, ServerConfig, TutorConfig, TutorPipeline};
use tutor_core::defaults;
use tutor_inference::mock::MockInferenceBackend;
use tutor_search::mock::StaticIndex;

fn app_with(backend: MockInferenceBackend, index: StaticIndex, config: TutorConfig) -> Router {
    let pipeline = TutorPipeline::from_backends(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(index),
        Arc::new(backend),
        config,
    );
    build_router(AppState::new(pipeline), &ServerConfig::default())
}

fn app(backend: MockInferenceBackend, index: StaticIndex) -> Router {
    app_with(backend, index, TutorConfig::default())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_liveness() {
    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).expect("utf8"), defaults::LIVENESS_TEXT);
}

#[tokio::test]
async fn test_health() {
    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_ask_returns_answer_with_footer() {
    let backend = MockInferenceBackend::new().with_fixed_response("Mini-aula");
    let index = StaticIndex::new()
        .with_snippet("trecho 1", "Livro A")
        .with_snippet("trecho 2", "Livro A");

    let response = app(backend, index)
        .oneshot(post_json("/ask", json!({"prompt": "O que é federalismo?"})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await;
    let text = body["text"].as_str().expect("text");
    assert!(text.starts_with("Mini-aula"));
    assert_eq!(text.matches("• Livro A").count(), 1);
}

#[tokio::test]
async fn test_perguntar_alias() {
    let backend = MockInferenceBackend::new().with_fixed_response("ok");

    let response = app(backend, StaticIndex::new())
        .oneshot(post_json("/perguntar", json!({"prompt": "pergunta", "images": []})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["text"],
        format!("ok{}", defaults::NO_SOURCES_FOOTER)
    );
}

#[tokio::test]
async fn test_empty_card_is_400() {
    let backend = MockInferenceBackend::new();

    let response = app(backend.clone(), StaticIndex::new())
        .oneshot(post_json("/ask", json!({"prompt": "", "images": []})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["text"], defaults::EMPTY_CARD_MESSAGE);
    assert!(backend.get_calls().is_empty());
}

#[tokio::test]
async fn test_missing_fields_is_400() {
    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(post_json("/ask", json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["text"], defaults::EMPTY_CARD_MESSAGE);
}

#[tokio::test]
async fn test_invalid_base64_is_400() {
    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(post_json("/ask", json!({"images": ["***"]})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_text_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"prompt\": "))
        .expect("request");

    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = body_json(response).await["text"]
        .as_str()
        .expect("text")
        .to_string();
    assert!(text.starts_with("Requisição inválida: "));
}

#[tokio::test]
async fn test_missing_content_type_uses_text_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/perguntar")
        .body(Body::from(json!({"prompt": "pergunta"}).to_string()))
        .expect("request");

    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["text"].is_string());
}

#[tokio::test]
async fn test_image_card_is_transcribed() {
    let backend = MockInferenceBackend::new().with_transcription("Questão 1: ...");

    let response = app(backend.clone(), StaticIndex::new())
        .oneshot(post_json("/ask", json!({"prompt": "", "images": ["/9j/4A=="]})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.vision_call_count(), 1);
    assert_eq!(backend.inputs_for("describe_image"), vec!["image/jpeg".to_string()]);
    assert_eq!(backend.inputs_for("embed"), vec!["Questão 1: ...".to_string()]);
}

#[tokio::test]
async fn test_generation_failure_is_opaque_500() {
    let backend = MockInferenceBackend::new().with_generate_failure();

    let response = app(backend, StaticIndex::new())
        .oneshot(post_json("/ask", json!({"prompt": "pergunta"})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["text"], defaults::INTERNAL_ERROR_MESSAGE);
    assert!(!body["text"].as_str().unwrap_or_default().contains("Simulated"));
}

#[tokio::test]
async fn test_error_details_exposed_when_enabled() {
    let backend = MockInferenceBackend::new().with_generate_failure();
    let config = TutorConfig {
        expose_error_details: true,
        ..TutorConfig::default()
    };

    let response = app_with(backend, StaticIndex::new(), config)
        .oneshot(post_json("/ask", json!({"prompt": "pergunta"})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let text = body["text"].as_str().expect("text");
    assert!(text.starts_with("Erro interno: "));
    assert!(text.contains("Simulated failure"));
}

#[tokio::test]
async fn test_openapi_document() {
    let response = app(MockInferenceBackend::new(), StaticIndex::new())
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"].get("/ask").is_some());
}
