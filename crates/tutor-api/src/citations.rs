//! Citation footer rendering and final response assembly.

use tutor_core::{defaults, FinalResponse, GeneratedAnswer, SourceSet};

/// Render the source footer appended to every answer.
///
/// An empty set yields the fixed "no sources" placeholder, so the footer is
/// never empty.
pub fn render_footer(sources: &SourceSet) -> String {
    if sources.is_empty() {
        return defaults::NO_SOURCES_FOOTER.to_string();
    }
    let list = sources
        .iter()
        .map(|label| format!("• {}", label))
        .collect::<Vec<_>>()
        .join("<br>");
    format!("{}<small>{}</small>", defaults::SOURCES_HEADER, list)
}

/// Concatenate the generated answer and its footer.
pub fn assemble_response(answer: GeneratedAnswer, footer: &str) -> FinalResponse {
    let mut text = answer.0;
    text.push_str(footer);
    FinalResponse { text }
}
