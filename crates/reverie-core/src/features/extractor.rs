//! Feature extractor with memoization
//!
//! Features are cached per memory id and validated against a SHA-256 of the
//! text, so an edited memory is re-extracted while repeated graph queries over
//! the same memories reuse earlier work.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::analyzer::{TextAnalysis, TextAnalyzer};
use super::embedder::TextEmbedder;
use crate::memory::Memory;

// ============================================================================
// FEATURES
// ============================================================================

/// Derived features of one memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryFeatures {
    /// The memory these features belong to
    pub memory_id: String,
    /// SHA-256 of the text the features were computed from
    pub content_hash: String,
    /// Semantic embedding
    pub embedding: Vec<f32>,
    /// Case-normalized entities
    pub entities: BTreeSet<String>,
    /// Case-normalized keywords, first-seen order
    pub keywords: Vec<String>,
    /// True when extraction failed and the zero fallback was used
    pub degraded: bool,
}

impl MemoryFeatures {
    /// Zero-vector fallback with no entities or keywords
    pub fn degraded(memory_id: impl Into<String>, content_hash: String, dimensions: usize) -> Self {
        Self {
            memory_id: memory_id.into(),
            content_hash,
            embedding: vec![0.0; dimensions],
            entities: BTreeSet::new(),
            keywords: Vec::new(),
            degraded: true,
        }
    }

    /// Embedding length
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// Hex SHA-256 of a memory's text
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Extracts and memoizes [`MemoryFeatures`]
pub struct FeatureExtractor {
    embedder: Arc<dyn TextEmbedder>,
    analyzer: Arc<dyn TextAnalyzer>,
    cache: Mutex<LruCache<String, Arc<MemoryFeatures>>>,
    concurrency: usize,
}

impl FeatureExtractor {
    /// Create an extractor
    ///
    /// `cache_capacity` of 0 is treated as 1. `concurrency` bounds in-flight
    /// embedding calls in [`extract_all`](Self::extract_all).
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        analyzer: Arc<dyn TextAnalyzer>,
        cache_capacity: usize,
        concurrency: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            embedder,
            analyzer,
            cache: Mutex::new(LruCache::new(capacity)),
            concurrency: concurrency.max(1),
        }
    }

    /// Dimensions of the injected embedding model
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Name of the injected embedding model
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Extract features for one memory
    ///
    /// Never fails: blank text or a failing capability yields degraded
    /// features so one bad memory cannot block the rest of the graph.
    pub async fn extract(&self, memory: &Memory) -> Arc<MemoryFeatures> {
        let hash = content_hash(&memory.text);

        if let Some(hit) = self.cached(&memory.id, &hash) {
            return hit;
        }

        if memory.is_blank() {
            tracing::debug!(memory_id = %memory.id, "Blank memory text, using zero features");
            return Arc::new(MemoryFeatures::degraded(&memory.id, hash, self.dimensions()));
        }

        let analysis: TextAnalysis = match self.analyzer.analyze(&memory.text) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(memory_id = %memory.id, "Text analysis failed: {}", e);
                return Arc::new(MemoryFeatures::degraded(&memory.id, hash, self.dimensions()));
            }
        };

        let embedding = match self.embedder.embed(&memory.text).await {
            Ok(v) if v.len() == self.dimensions() => v,
            Ok(v) => {
                tracing::warn!(
                    memory_id = %memory.id,
                    expected = self.dimensions(),
                    got = v.len(),
                    "Embedding has unexpected dimensions"
                );
                return Arc::new(MemoryFeatures::degraded(&memory.id, hash, self.dimensions()));
            }
            Err(e) => {
                tracing::warn!(
                    memory_id = %memory.id,
                    model = self.embedder.model_name(),
                    "Embedding failed: {}",
                    e
                );
                return Arc::new(MemoryFeatures::degraded(&memory.id, hash, self.dimensions()));
            }
        };

        let features = Arc::new(MemoryFeatures {
            memory_id: memory.id.clone(),
            content_hash: hash,
            embedding,
            entities: analysis.entities,
            keywords: analysis.keywords,
            degraded: false,
        });

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(memory.id.clone(), Arc::clone(&features));
        }

        features
    }

    /// Extract features for many memories, preserving input order
    ///
    /// The per-memory futures are boxed up front so the returned future stays
    /// `Send` and can run on a multi-threaded runtime.
    pub async fn extract_all(&self, memories: &[Memory]) -> Vec<Arc<MemoryFeatures>> {
        let pending: Vec<BoxFuture<'_, Arc<MemoryFeatures>>> = memories
            .iter()
            .map(|m| Box::pin(self.extract(m)) as BoxFuture<'_, _>)
            .collect();
        stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Cached features, if still valid for the given content hash
    fn cached(&self, memory_id: &str, hash: &str) -> Option<Arc<MemoryFeatures>> {
        let mut cache = self.cache.lock().ok()?;
        match cache.get(memory_id).cloned() {
            Some(f) if f.content_hash == hash => Some(f),
            Some(_) => {
                cache.pop(memory_id);
                None
            }
            None => None,
        }
    }

    /// Drop a memory's cached features
    pub fn invalidate(&self, memory_id: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(memory_id);
        }
    }

    /// Number of cached entries
    pub fn cache_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
