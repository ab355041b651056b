//! Text Feature Extraction
//!
//! Turns a memory's text into the features the relationship scorer compares:
//! - Semantic embedding from an injected [`TextEmbedder`]
//! - Named entities and keywords from an injected [`TextAnalyzer`]
//! - Memoization keyed by memory id and content hash
//!
//! The default capabilities ([`HashingEmbedder`], [`HeuristicAnalyzer`]) are
//! deterministic and need no model download. Enable the `embeddings` feature
//! for local ONNX inference with fastembed.

mod analyzer;
mod embedder;
mod extractor;

#[cfg(feature = "embeddings")]
mod local;

pub use analyzer::{is_stop_word, AnalysisError, HeuristicAnalyzer, TextAnalysis, TextAnalyzer};
pub use embedder::{
    cosine_similarity, EmbeddingError, HashingEmbedder, TextEmbedder, DEFAULT_DIMENSIONS,
};
pub use extractor::{content_hash, FeatureExtractor, MemoryFeatures};

#[cfg(feature = "embeddings")]
pub use local::{LocalEmbedder, MAX_TEXT_LENGTH};
