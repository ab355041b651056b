//! Embedding capability
//!
//! The embedding model is injected behind [`TextEmbedder`]. Implementations must
//! be thread-safe; the extractor calls them concurrently for different memories.

use async_trait::async_trait;

use super::analyzer::normalized_words;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default embedding dimensions (matches all-MiniLM-L6-v2)
pub const DEFAULT_DIMENSIONS: usize = 384;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding error types
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("Model initialization failed: {0}")]
    ModelInit(String),
    /// Failed to generate embedding
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
    /// Invalid input (empty, too long, etc.)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// CAPABILITY
// ============================================================================

/// An embedding model that maps text to a fixed-dimension vector
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Model identifier, for logging
    fn model_name(&self) -> &str;

    /// Length of every vector this model produces
    fn dimensions(&self) -> usize;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

// ============================================================================
// HASHING EMBEDDER
// ============================================================================

/// Deterministic bag-of-words embedder using the hashing trick
///
/// Each non-stop-word is hashed (FNV-1a) into a signed bucket and the vector is
/// L2-normalized. Texts sharing vocabulary get high cosine similarity. Cheap,
/// reproducible across runs and platforms, and needs no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create an embedder producing `dimensions`-long vectors (at least 1)
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Synchronous embedding, shared by the async trait method
    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let mut vector = vec![0.0_f32; self.dimensions];
        for word in normalized_words(text).filter(|w| !super::is_stop_word(w)) {
            let hash = fnv1a(word.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

#[async_trait]
impl TextEmbedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing-bow"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_sync(text)
    }
}

/// 64-bit FNV-1a
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

// ============================================================================
// SIMILARITY FUNCTIONS
// ============================================================================

/// L2-normalize in place; zero vectors are left untouched
#[inline]
pub(crate) fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Compute cosine similarity between two vectors
///
/// Returns 0.0 for mismatched lengths or zero vectors. Symmetric in its
/// arguments.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator > 0.0 {
        dot_product / denominator
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
