//! Vision backend trait and the card-image transcriber.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tutor_core::{defaults, run_bounded, CardImage, ItemType, Result, TranscriptionResult};

/// Backend for reading images using a multimodal model.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Describe or transcribe an image according to `prompt`.
    async fn describe_image(&self, image_data: &[u8], mime_type: &str, prompt: &str)
        -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Instruction sent with the card image.
///
/// The model transcribes the text and reports the item type and any visible
/// answer key on two marker lines. It must not solve the question.
pub const TRANSCRIPTION_PROMPT: &str = "\
Você é um transcritor de questões de prova. Transcreva TODO o texto visível na imagem, \
na ordem em que aparece, incluindo enunciado, alternativas, tabelas e legendas. \
Não resolva a questão e não comente o conteúdo.

Depois da transcrição, acrescente exatamente duas linhas:
TIPO: CERTO_ERRADO ou MULTIPLA_ESCOLHA (ou NENHUM se não for uma questão)
GABARITO: a resposta marcada na imagem (ou NENHUM se não houver gabarito visível)";

static TYPE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*TIPO\s*:\s*(.+?)\s*$").expect("valid regex"));

static ANSWER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*GABARITO\s*:\s*(.+?)\s*$").expect("valid regex"));

fn marker_value(raw: &str) -> Option<&str> {
    let value = raw.trim();
    let upper = value.to_uppercase();
    if value.is_empty() || value == "-" || upper == "NENHUM" || upper == "NENHUMA" {
        None
    } else {
        Some(value)
    }
}

/// Split a raw model reply into transcription text and marker hints.
///
/// Marker lines are removed from the text. Unknown or `NENHUM` values leave
/// the corresponding field unset.
pub fn parse_transcription(raw: &str) -> TranscriptionResult {
    let item_type = TYPE_MARKER
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| marker_value(m.as_str()))
        .and_then(|v| v.parse::<ItemType>().ok());

    let answer_key = ANSWER_MARKER
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| marker_value(m.as_str()))
        .map(str::to_string);

    let without_type = TYPE_MARKER.replace_all(raw, "");
    let text = ANSWER_MARKER.replace_all(&without_type, "");

    TranscriptionResult {
        text: text.trim().to_string(),
        item_type,
        answer_key,
    }
}

/// Turns the first card image into text. Never fails the request.
pub struct VisualTranscriber {
    backend: Arc<dyn VisionBackend>,
    prompt: String,
    timeout: Duration,
}

impl VisualTranscriber {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self {
            backend,
            prompt: TRANSCRIPTION_PROMPT.to_string(),
            timeout: Duration::from_secs(defaults::STAGE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Transcribe one image. Any failure, including timeout and
    /// cancellation, is logged and yields an empty result.
    pub async fn transcribe(
        &self,
        image: &CardImage,
        cancel: &CancellationToken,
    ) -> TranscriptionResult {
        let start = Instant::now();
        let call = self
            .backend
            .describe_image(&image.data, &image.mime_type, &self.prompt);

        match run_bounded("transcription", self.timeout, cancel, call).await {
            Ok(raw) => {
                let result = parse_transcription(&raw);
                debug!(
                    subsystem = "inference",
                    component = "transcriber",
                    model = self.backend.model_name(),
                    chars = result.text.chars().count(),
                    item_type = ?result.item_type,
                    has_answer_key = result.answer_key.is_some(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Transcription complete"
                );
                result
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "transcriber",
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Transcription failed, continuing without it"
                );
                TranscriptionResult::empty()
            }
        }
    }
}
