//! Semantic retrieval against the pre-built vector index.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use tutor_core::{
    defaults, logging, run_bounded, ComposedQuery, EmbeddingBackend, EmbeddingTask, Error, IndexMatch,
    Result, RetrievalMatch, VectorIndex,
};

/// Configuration for retrieval.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Number of nearest neighbours to request.
    pub top_k: usize,
    /// Bound on each upstream call (embedding, index query).
    pub stage_timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::TOP_K,
            stage_timeout: Duration::from_secs(defaults::STAGE_TIMEOUT_SECS),
        }
    }
}

/// Embeds a composed query and looks up the nearest snippets.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingBackend>,
    index: Arc<dyn VectorIndex>,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, index: Arc<dyn VectorIndex>) -> Self {
        Self::with_config(embedder, index, RetrieverConfig::default())
    }

    pub fn with_config(
        embedder: Arc<dyn EmbeddingBackend>,
        index: Arc<dyn VectorIndex>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve up to `top_k` usable matches in index rank order.
    ///
    /// Embedding and index failures are returned to the caller; they are
    /// fatal for the request.
    pub async fn retrieve(
        &self,
        query: &ComposedQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalMatch>> {
        let start = Instant::now();
        let texts = vec![query.as_str().to_string()];

        let vectors = run_bounded(
            "embedding",
            self.config.stage_timeout,
            cancel,
            self.embedder.embed_texts(&texts, EmbeddingTask::RetrievalQuery),
        )
        .await?;

        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Embedding service returned no vector".into()))?;

        let embed_ms = start.elapsed().as_millis() as u64;
        let raw = run_bounded(
            "vector_query",
            self.config.stage_timeout,
            cancel,
            self.index.query(&vector, self.config.top_k, true),
        )
        .await?;

        let raw_count = raw.len();
        let matches: Vec<RetrievalMatch> = raw.into_iter().filter_map(to_retrieval_match).collect();

        debug!(
            { logging::SUBSYSTEM } = "search",
            { logging::COMPONENT } = "retriever",
            index = self.index.index_name(),
            { logging::QUERY_LEN } = query.char_len(),
            raw_count,
            { logging::RESULT_COUNT } = matches.len(),
            embed_ms,
            { logging::DURATION_MS } = start.elapsed().as_millis() as u64,
            "Retrieval complete"
        );
        Ok(matches)
    }
}

/// Keep a match only if its metadata carries a string `text` field.
fn to_retrieval_match(m: IndexMatch) -> Option<RetrievalMatch> {
    let text = match m.metadata.get(defaults::METADATA_TEXT_FIELD) {
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => {
            trace!(id = %m.id, "Skipping match without text metadata");
            return None;
        }
    };
    let source = m
        .metadata
        .get(defaults::METADATA_SOURCE_FIELD)
        .and_then(|v| v.as_str())
        .unwrap_or(defaults::UNKNOWN_SOURCE)
        .to_string();

    Some(RetrievalMatch {
        text,
        source,
        score: m.score,
    })
}
