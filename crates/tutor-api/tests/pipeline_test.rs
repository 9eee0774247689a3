//! End-to-end pipeline scenarios against mock backends.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tutor_api::{ImageStrategy, TutorConfig, TutorPipeline};
use tutor_core::{defaults, CardImage, Error, PromptProfile, StudyCard};
use tutor_inference::mock::MockInferenceBackend;
use tutor_search::mock::StaticIndex;

const JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn pipeline(backend: &MockInferenceBackend, index: &StaticIndex, config: TutorConfig) -> TutorPipeline {
    TutorPipeline::from_backends(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(index.clone()),
        Arc::new(backend.clone()),
        config,
    )
}

fn jpeg_card(text: &str) -> StudyCard {
    StudyCard::new(text, vec![CardImage::from_bytes(JPEG.to_vec())])
}

#[tokio::test]
async fn test_empty_card_is_rejected() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    let result = p.answer(&StudyCard::default(), &CancellationToken::new()).await;

    match result {
        Err(Error::InvalidInput(msg)) => assert_eq!(msg, defaults::EMPTY_CARD_MESSAGE),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
    assert!(backend.get_calls().is_empty());
}

#[tokio::test]
async fn test_no_matches_yields_placeholder_footer() {
    let backend = MockInferenceBackend::new().with_fixed_response("Mini-aula");
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    let response = p
        .answer(&StudyCard::new("O que é federalismo?", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.text, format!("Mini-aula{}", defaults::NO_SOURCES_FOOTER));
    let prompts = backend.inputs_for("generate");
    assert!(prompts[0].contains(defaults::NO_REFERENCE_CONTEXT));
}

#[tokio::test]
async fn test_repeated_source_listed_once() {
    let backend = MockInferenceBackend::new().with_fixed_response("Resposta");
    let index = StaticIndex::new()
        .with_snippet("O federalismo brasileiro...", "Livro A")
        .with_snippet("A União, os Estados...", "Livro A");
    let p = pipeline(&backend, &index, TutorConfig::default());

    let response = p
        .answer(&StudyCard::new("O que é federalismo?", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.text.matches("• Livro A").count(), 1);
    assert!(response.text.ends_with("<small>• Livro A</small>"));
    assert!(response.text.starts_with("Resposta\n\n<hr><b>📚 Fontes Consultadas:</b>"));
}

#[tokio::test]
async fn test_snippets_follow_index_rank() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new()
        .with_snippet("primeiro trecho", "A")
        .with_metadata(serde_json::json!({"source": "sem texto"}))
        .with_snippet("segundo trecho", "B");
    let p = pipeline(&backend, &index, TutorConfig::default());

    p.answer(&StudyCard::new("pergunta", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    let prompt = &backend.inputs_for("generate")[0];
    assert!(prompt.contains("primeiro trecho\n---\nsegundo trecho"));
    assert!(!prompt.contains("sem texto"));
    assert_eq!(index.queries(), vec![(defaults::TOP_K, true)]);
}

#[tokio::test]
async fn test_composed_query_respects_cap() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    let long_text = "á".repeat(defaults::QUERY_CHAR_CAP + 500);
    p.answer(&StudyCard::new(long_text, vec![]), &CancellationToken::new())
        .await
        .unwrap();

    let embedded = backend.inputs_for("embed");
    assert_eq!(embedded.len(), 1);
    assert_eq!(embedded[0].chars().count(), defaults::QUERY_CHAR_CAP);
}

#[tokio::test]
async fn test_image_only_card_searches_with_transcription() {
    let backend = MockInferenceBackend::new().with_transcription("Questão 1: ...");
    let index = StaticIndex::new().with_snippet("trecho", "Lei 8.080");
    let p = pipeline(&backend, &index, TutorConfig::default());

    let response = p
        .answer(&jpeg_card(""), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(backend.vision_call_count(), 1);
    assert_eq!(backend.inputs_for("embed"), vec!["Questão 1: ...".to_string()]);
    assert_eq!(index.queries().len(), 1);
    assert!(response.text.contains("• Lei 8.080"));
    let prompt = &backend.inputs_for("generate")[0];
    assert!(prompt.contains("TRANSCRIÇÃO DA IMAGEM DO CARD:\nQuestão 1: ..."));
}

#[tokio::test]
async fn test_text_and_transcription_are_combined() {
    let backend = MockInferenceBackend::new().with_transcription("Julgue o item.\nTIPO: CERTO_ERRADO");
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    p.answer(&jpeg_card("Direito constitucional"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        backend.inputs_for("embed"),
        vec!["Direito constitucional Julgue o item.".to_string()]
    );
    let prompt = &backend.inputs_for("generate")[0];
    assert!(prompt.contains("Tipo de questão detectado: certo/errado"));
}

#[tokio::test]
async fn test_transcription_failure_is_not_fatal() {
    let backend = MockInferenceBackend::new()
        .with_vision_failure()
        .with_fixed_response("Resposta");
    let index = StaticIndex::new().with_snippet("trecho", "Livro A");
    let p = pipeline(&backend, &index, TutorConfig::default());

    let response = p
        .answer(&jpeg_card("O que é federalismo?"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(backend.inputs_for("embed"), vec!["O que é federalismo?".to_string()]);
    assert!(response.text.starts_with("Resposta"));
    assert!(!backend.inputs_for("generate")[0].contains("TRANSCRIÇÃO DA IMAGEM"));
}

#[tokio::test]
async fn test_image_with_failed_transcription_and_no_text_skips_retrieval() {
    let backend = MockInferenceBackend::new().with_vision_failure();
    let index = StaticIndex::new().with_snippet("trecho", "Livro A");
    let p = pipeline(&backend, &index, TutorConfig::default());

    let response = p.answer(&jpeg_card(""), &CancellationToken::new()).await.unwrap();

    assert_eq!(backend.embed_call_count(), 0);
    assert!(index.queries().is_empty());
    assert!(response.text.ends_with(defaults::NO_SOURCES_FOOTER));
}

#[tokio::test]
async fn test_whitespace_text_skips_retrieval() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new().with_snippet("trecho", "Livro A");
    let p = pipeline(&backend, &index, TutorConfig::default());

    let response = p
        .answer(&StudyCard::new("   ", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(backend.embed_call_count(), 0);
    assert_eq!(backend.generate_call_count(), 1);
    assert!(response.text.ends_with(defaults::NO_SOURCES_FOOTER));
}

#[tokio::test]
async fn test_generation_failure_is_fatal() {
    let backend = MockInferenceBackend::new().with_generate_failure();
    let index = StaticIndex::new().with_snippet("trecho", "Livro A");
    let p = pipeline(&backend, &index, TutorConfig::default());

    let result = p
        .answer(&StudyCard::new("pergunta", vec![]), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Inference(_))));
}

#[tokio::test]
async fn test_embedding_failure_is_fatal() {
    let backend = MockInferenceBackend::new().with_embed_failure();
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    let result = p
        .answer(&StudyCard::new("pergunta", vec![]), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Embedding(_))));
    assert_eq!(backend.generate_call_count(), 0);
}

#[tokio::test]
async fn test_index_failure_is_fatal() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new().with_failure();
    let p = pipeline(&backend, &index, TutorConfig::default());

    let result = p
        .answer(&StudyCard::new("pergunta", vec![]), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::VectorIndex(_))));
    assert_eq!(backend.generate_call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stage_timeout_is_fatal() {
    let backend = MockInferenceBackend::new().with_latency_ms(30_000);
    let index = StaticIndex::new();
    let config = TutorConfig {
        stage_timeout: Duration::from_secs(2),
        ..TutorConfig::default()
    };
    let p = pipeline(&backend, &index, config);

    let result = p
        .answer(&StudyCard::new("pergunta", vec![]), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Timeout(_))));
}

#[tokio::test(start_paused = true)]
async fn test_transcription_timeout_is_recovered() {
    let vision = MockInferenceBackend::new()
        .with_transcription("nunca chega")
        .with_latency_ms(600_000);
    let backend = MockInferenceBackend::new().with_fixed_response("Resposta");
    let index = StaticIndex::new().with_snippet("trecho", "Livro A");
    let config = TutorConfig {
        stage_timeout: Duration::from_secs(2),
        ..TutorConfig::default()
    };
    let p = TutorPipeline::from_backends(
        Arc::new(vision.clone()),
        Arc::new(backend.clone()),
        Arc::new(index.clone()),
        Arc::new(backend.clone()),
        config,
    );

    let response = p
        .answer(&jpeg_card("pergunta"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(vision.vision_call_count(), 1);
    assert_eq!(backend.inputs_for("embed"), vec!["pergunta".to_string()]);
    assert!(response.text.starts_with("Resposta"));
    assert!(response.text.contains("• Livro A"));
}

#[tokio::test]
async fn test_only_first_image_is_transcribed() {
    let backend = MockInferenceBackend::new().with_transcription("Questão 2");
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());
    let card = StudyCard::new(
        "",
        vec![
            CardImage::from_bytes(PNG.to_vec()),
            CardImage::from_bytes(JPEG.to_vec()),
        ],
    );

    p.answer(&card, &CancellationToken::new()).await.unwrap();

    assert_eq!(backend.inputs_for("describe_image"), vec!["image/png".to_string()]);
    assert_eq!(backend.inputs_for("embed"), vec!["Questão 2".to_string()]);
}

#[tokio::test]
async fn test_cancellation_stops_before_generation() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = p.answer(&StudyCard::new("pergunta", vec![]), &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled(_))));
    assert_eq!(backend.generate_call_count(), 0);
}

#[tokio::test]
async fn test_answer_key_rules_present_either_way() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    p.answer(
        &StudyCard::new("A União é soberana. Gabarito: Errado", vec![]),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    p.answer(&StudyCard::new("A União é soberana.", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    let prompts = backend.inputs_for("generate");
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().all(|p| p.contains("--- GABARITO ---")));
}

#[tokio::test]
async fn test_attach_strategy_sends_images() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let config = TutorConfig {
        image_strategy: ImageStrategy::AttachImages,
        ..TutorConfig::default()
    };
    let p = pipeline(&backend, &index, config);

    p.answer(&jpeg_card("gráfico"), &CancellationToken::new())
        .await
        .unwrap();

    let generate = backend
        .get_calls()
        .into_iter()
        .find(|c| c.operation == "generate")
        .unwrap();
    assert_eq!(generate.image_count, 1);
}

#[tokio::test]
async fn test_transcribe_only_strategy_sends_text() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let p = pipeline(&backend, &index, TutorConfig::default());

    p.answer(&jpeg_card("gráfico"), &CancellationToken::new())
        .await
        .unwrap();

    let generate = backend
        .get_calls()
        .into_iter()
        .find(|c| c.operation == "generate")
        .unwrap();
    assert_eq!(generate.image_count, 0);
}

#[tokio::test]
async fn test_profile_restriction_reaches_prompt() {
    let backend = MockInferenceBackend::new();
    let index = StaticIndex::new();
    let config = TutorConfig {
        profiles: vec![PromptProfile::Health],
        ..TutorConfig::default()
    };
    let p = pipeline(&backend, &index, config);

    p.answer(&StudyCard::new("dose", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    let prompt = &backend.inputs_for("generate")[0];
    assert!(prompt.contains("SAÚDE / FARMÁCIA"));
    assert!(!prompt.contains("TECNOLOGIA (TI)"));
}
