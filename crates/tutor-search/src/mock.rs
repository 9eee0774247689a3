//! In-memory vector index for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use tutor_core::{Error, IndexMatch, Result, VectorIndex};

/// Returns a fixed list of matches regardless of the query vector.
#[derive(Clone, Default)]
pub struct StaticIndex {
    matches: Vec<IndexMatch>,
    fail: bool,
    queries: Arc<Mutex<Vec<(usize, bool)>>>,
}

impl StaticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match with `text` and `source` metadata.
    pub fn with_snippet(self, text: &str, source: &str) -> Self {
        self.with_metadata(json!({"text": text, "source": source}))
    }

    /// Append a match with arbitrary metadata.
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        let rank = self.matches.len();
        self.matches.push(IndexMatch {
            id: format!("chunk-{}", rank),
            score: 1.0 - rank as f32 * 0.1,
            metadata: metadata.as_object().cloned().unwrap_or_else(Map::new),
        });
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// `(top_k, include_metadata)` of each query received.
    pub fn queries(&self) -> Vec<(usize, bool)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        self.queries.lock().unwrap().push((top_k, include_metadata));
        if self.fail {
            return Err(Error::VectorIndex("Simulated failure for testing".into()));
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    fn index_name(&self) -> &str {
        "static"
    }
}
