//! Context assembly from retrieval matches.

use tutor_core::{RetrievalMatch, RetrievedContext, SourceSet};

/// Collect snippets in rank order and deduplicate their sources.
pub fn assemble(matches: Vec<RetrievalMatch>) -> RetrievedContext {
    let mut snippets = Vec::with_capacity(matches.len());
    let mut sources = SourceSet::new();
    for m in matches {
        sources.insert(m.source);
        snippets.push(m.text);
    }
    RetrievedContext { snippets, sources }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::defaults;

    fn m(text: &str, source: &str) -> RetrievalMatch {
        RetrievalMatch {
            text: text.to_string(),
            source: source.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn test_empty_matches_use_fallback() {
        let ctx = assemble(vec![]);
        assert!(ctx.is_empty());
        assert!(ctx.sources.is_empty());
        assert_eq!(ctx.render(), defaults::NO_REFERENCE_CONTEXT);
    }

    #[test]
    fn test_rank_order_preserved() {
        let ctx = assemble(vec![m("primeiro", "A"), m("segundo", "B"), m("terceiro", "C")]);
        assert_eq!(ctx.render(), "primeiro\n---\nsegundo\n---\nterceiro");
    }

    #[test]
    fn test_sources_deduplicated() {
        let ctx = assemble(vec![m("x", "Livro A"), m("y", "Livro A"), m("z", "Livro B")]);
        assert_eq!(ctx.snippets.len(), 3);
        assert_eq!(ctx.sources.len(), 2);
        assert_eq!(ctx.sources.iter().collect::<Vec<_>>(), vec!["Livro A", "Livro B"]);
    }
}
