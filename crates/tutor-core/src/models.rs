//! Core data models for anki-tutor.
//!
//! Every type here is request-scoped: created, transformed and dropped while
//! answering a single study card.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// CARD INPUT
// =============================================================================

/// A single image attached to a study card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl CardImage {
    /// Wrap raw bytes, sniffing the MIME type from magic bytes.
    ///
    /// Falls back to [`defaults::DEFAULT_IMAGE_MIME`] when the format is not
    /// recognised as an image; the Anki add-on sends JPEG.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = infer::get(&data)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| defaults::DEFAULT_IMAGE_MIME.to_string());
        Self { data, mime_type }
    }
}

/// The user's study card: typed text plus any number of images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyCard {
    pub text: String,
    pub images: Vec<CardImage>,
}

impl StudyCard {
    pub fn new(text: impl Into<String>, images: Vec<CardImage>) -> Self {
        Self {
            text: text.into(),
            images,
        }
    }

    /// True when the typed text has any non-whitespace content.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    /// The image handed to the transcriber. Additional images are accepted
    /// but only used when the generator attaches images directly.
    pub fn primary_image(&self) -> Option<&CardImage> {
        self.images.first()
    }

    /// Reject a card with neither text nor images.
    ///
    /// Whitespace-only text still counts as text here: the card was not
    /// empty, it simply yields no retrieval query.
    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() && self.images.is_empty() {
            return Err(Error::InvalidInput(
                defaults::EMPTY_CARD_MESSAGE.to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TRANSCRIPTION
// =============================================================================

/// Kind of exam item recognised in a card image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    MultipleChoice,
    TrueFalse,
}

impl ItemType {
    /// Portuguese label used when echoing the item type back to the model.
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::MultipleChoice => "múltipla escolha",
            ItemType::TrueFalse => "certo/errado",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::MultipleChoice => write!(f, "MULTIPLA_ESCOLHA"),
            ItemType::TrueFalse => write!(f, "CERTO_ERRADO"),
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' ', '/'], "_");
        match normalized.as_str() {
            "MULTIPLA_ESCOLHA" | "MÚLTIPLA_ESCOLHA" | "MULTIPLE_CHOICE" => {
                Ok(ItemType::MultipleChoice)
            }
            "CERTO_ERRADO" | "VERDADEIRO_FALSO" | "TRUE_FALSE" | "V_F" | "C_E" => {
                Ok(ItemType::TrueFalse)
            }
            _ => Err(format!("Unknown item type: {}", s)),
        }
    }
}

/// Text read from one card image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<String>,
}

impl TranscriptionResult {
    /// The result used when transcription is skipped or failed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Search string sent to the embedding service.
///
/// Only constructed through the query composer, which guarantees it is
/// non-empty and within the character cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedQuery(String);

impl ComposedQuery {
    /// Wrap an already-bounded, non-blank string. Returns `None` otherwise.
    pub fn new(text: String, char_cap: usize) -> Option<Self> {
        if text.trim().is_empty() || text.chars().count() > char_cap {
            return None;
        }
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Hint passed to the embedding service about what the text will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingTask {
    RetrievalQuery,
}

/// Raw nearest-neighbour hit returned by a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
}

/// A usable snippet extracted from an index match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMatch {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Deduplicated set of source labels.
///
/// Labels are kept in first-seen order so rendering is stable, but callers
/// must not rely on ordering for correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    labels: Vec<String>,
    seen: HashSet<String>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label; returns false if it was already present.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.seen.contains(&label) {
            return false;
        }
        self.seen.insert(label.clone());
        self.labels.push(label);
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.seen.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SourceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SourceSet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

/// Snippets in rank order plus the sources they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub snippets: Vec<String>,
    pub sources: SourceSet,
}

impl RetrievedContext {
    /// Context for a request where nothing was retrieved.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// The context block handed to the prompt builder. Never empty.
    pub fn render(&self) -> String {
        if self.snippets.is_empty() {
            return defaults::NO_REFERENCE_CONTEXT.to_string();
        }
        self.snippets.join(defaults::CONTEXT_SEPARATOR)
    }
}

// =============================================================================
// PROMPT PROFILES
// =============================================================================

/// Subject-domain lens offered to the model as optional guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptProfile {
    /// Law, public-health legislation, auditing, Portuguese.
    Legal,
    /// Pharmacology, chemistry, physiology.
    Health,
    /// Mathematics, logic, accounting, economics.
    Quantitative,
    /// Databases, SQL, engineering.
    Technology,
}

impl PromptProfile {
    pub const ALL: [PromptProfile; 4] = [
        PromptProfile::Legal,
        PromptProfile::Health,
        PromptProfile::Quantitative,
        PromptProfile::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptProfile::Legal => "legal",
            PromptProfile::Health => "health",
            PromptProfile::Quantitative => "quantitative",
            PromptProfile::Technology => "technology",
        }
    }
}

impl fmt::Display for PromptProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PromptProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legal" | "juridica" | "jurídica" => Ok(PromptProfile::Legal),
            "health" | "saude" | "saúde" => Ok(PromptProfile::Health),
            "quantitative" | "exatas" => Ok(PromptProfile::Quantitative),
            "technology" | "tech" | "ti" => Ok(PromptProfile::Technology),
            _ => Err(format!("Invalid prompt profile: {}", s)),
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Raw text returned by the generative model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAnswer(pub String);

impl GeneratedAnswer {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Payload returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResponse {
    pub text: String,
}
