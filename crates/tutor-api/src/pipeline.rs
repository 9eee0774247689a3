//! The study-card answering pipeline.
//!
//! Stages run strictly in sequence:
//! transcription (only with images) → query composition → retrieval (only
//! with a non-empty query) → context assembly → prompt → generation →
//! citation footer.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tutor_core::{
    logging, run_bounded, EmbeddingBackend, FinalResponse, GeneratedAnswer, GenerationBackend, Result,
    RetrievedContext, StudyCard, TranscriptionResult, VectorIndex,
};
use tutor_inference::{PromptBuilder, PromptInput, VisionBackend, VisualTranscriber};
use tutor_search::{assemble, compose, Retriever, RetrieverConfig};

use crate::citations::{assemble_response, render_footer};
use crate::config::{ImageStrategy, TutorConfig};

/// Wires the stage components together. Shared by all requests.
pub struct TutorPipeline {
    transcriber: VisualTranscriber,
    retriever: Retriever,
    prompts: PromptBuilder,
    generator: Arc<dyn GenerationBackend>,
    config: TutorConfig,
}

impl TutorPipeline {
    pub fn new(
        transcriber: VisualTranscriber,
        retriever: Retriever,
        generator: Arc<dyn GenerationBackend>,
        config: TutorConfig,
    ) -> Self {
        Self {
            transcriber: transcriber.with_timeout(config.stage_timeout),
            retriever,
            prompts: PromptBuilder::with_profiles(&config.profiles),
            generator,
            config,
        }
    }

    /// Build every stage from the injected backends using `config`.
    pub fn from_backends(
        vision: Arc<dyn VisionBackend>,
        embedder: Arc<dyn EmbeddingBackend>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerationBackend>,
        config: TutorConfig,
    ) -> Self {
        let retriever = Retriever::with_config(
            embedder,
            index,
            RetrieverConfig {
                top_k: config.top_k,
                stage_timeout: config.stage_timeout,
            },
        );
        Self::new(VisualTranscriber::new(vision), retriever, generator, config)
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    /// Answer one card.
    ///
    /// Returns `Error::InvalidInput` for an empty card. Retrieval and
    /// generation failures (including timeouts and cancellation) are
    /// returned as-is; transcription failures are absorbed.
    pub async fn answer(&self, card: &StudyCard, cancel: &CancellationToken) -> Result<FinalResponse> {
        card.validate()?;
        let start = Instant::now();

        let transcription: Option<TranscriptionResult> = match card.primary_image() {
            Some(image) => Some(self.transcriber.transcribe(image, cancel).await),
            None => None,
        };

        let context = match compose(&card.text, transcription.as_ref(), self.config.query_char_cap) {
            Some(query) => {
                debug!(stage = "retrieval", query_len = query.char_len(), "Query composed");
                assemble(self.retriever.retrieve(&query, cancel).await?)
            }
            None => {
                debug!(stage = "retrieval", "Empty query, skipping retrieval");
                RetrievedContext::empty()
            }
        };

        let attach = self.config.image_strategy == ImageStrategy::AttachImages && card.has_images();
        let rendered = context.render();
        let prompt = self.prompts.build(&PromptInput {
            card_text: &card.text,
            transcription: transcription.as_ref(),
            context: &rendered,
            images_attached: attach,
        });

        let gen_start = Instant::now();
        let raw = if attach {
            run_bounded(
                "generation",
                self.config.stage_timeout,
                cancel,
                self.generator.generate_with_images(&prompt, &card.images),
            )
            .await?
        } else {
            run_bounded(
                "generation",
                self.config.stage_timeout,
                cancel,
                self.generator.generate(&prompt),
            )
            .await?
        };
        debug!(
            { logging::STAGE } = "generation",
            { logging::PROMPT_LEN } = prompt.len(),
            { logging::RESPONSE_LEN } = raw.len(),
            { logging::IMAGE_COUNT } = if attach { card.images.len() } else { 0 },
            { logging::DURATION_MS } = gen_start.elapsed().as_millis() as u64,
            "Answer generated"
        );

        let footer = render_footer(&context.sources);
        let response = assemble_response(GeneratedAnswer(raw), &footer);

        info!(
            { logging::SUBSYSTEM } = "api",
            { logging::COMPONENT } = "pipeline",
            snippets = context.snippets.len(),
            { logging::SOURCE_COUNT } = context.sources.len(),
            transcribed = transcription.as_ref().is_some_and(|t| !t.is_empty()),
            { logging::DURATION_MS } = start.elapsed().as_millis() as u64,
            "Card answered"
        );
        Ok(response)
    }
}
