//! Retrieval query composition.

use tracing::debug;
use tutor_core::{ComposedQuery, TranscriptionResult};

/// Combine typed card text and an optional transcription into one query.
///
/// Parts are joined with a single space, trimmed, and truncated to
/// `char_cap` characters on a character boundary. Returns `None` when
/// nothing searchable remains, in which case retrieval is skipped.
pub fn compose(
    text: &str,
    transcription: Option<&TranscriptionResult>,
    char_cap: usize,
) -> Option<ComposedQuery> {
    let mut joined = String::with_capacity(text.len());
    joined.push_str(text);
    if let Some(t) = transcription.filter(|t| !t.is_empty()) {
        joined.push(' ');
        joined.push_str(&t.text);
    }

    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return None;
    }

    let bounded: String = match trimmed.char_indices().nth(char_cap) {
        Some((cut, _)) => {
            debug!(
                component = "query",
                char_cap,
                "Composed query truncated"
            );
            trimmed[..cut].trim_end().to_string()
        }
        None => trimmed.to_string(),
    };

    ComposedQuery::new(bounded, char_cap)
}
