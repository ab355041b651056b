//! # Reverie Core
//!
//! Relationship engine for personal journal memories. Given a user's journal
//! entries it computes a weighted graph of pairwise relationships and
//! partitions that graph into thematic clusters.
//!
//! - **Feature Extraction**: injected embedding model plus entity/keyword analysis,
//!   memoized per memory and content hash
//! - **Multi-factor Scoring**: semantic similarity, temporal proximity, shared
//!   entities, and mood correlation summed into one relationship strength
//! - **Relationship Graphs**: all-pairs scoring with threshold filtering,
//!   cooperative cancellation, and manual relationships merged on top
//! - **Clustering**: deterministic Louvain community detection with keyword themes
//! - **Paths**: Dijkstra over inverse relationship strength
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reverie_core::{EngineConfig, GraphQuery, GraphService, NewMemory, SqliteStore};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = Arc::new(SqliteStore::new(None)?);
//! store.create_user("ada", Some("Ada"))?;
//! store.insert_memory(NewMemory::new("ada", "Went hiking with Sam"))?;
//!
//! let service = GraphService::with_defaults(store, EngineConfig::default());
//! let view = service
//!     .graph("ada", &GraphQuery::default(), &CancellationToken::new())
//!     .await?;
//! println!("{} connections", view.graph.stats.total_connections);
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `embeddings`: Local ONNX embeddings with fastembed (all-MiniLM-L6-v2)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clusters;
pub mod config;
pub mod features;
pub mod graph;
pub mod memory;
pub mod relationships;
pub mod service;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{Memory, Mood, NewMemory, TimeRange};

// Feature extraction
pub use features::{
    content_hash, cosine_similarity, AnalysisError, EmbeddingError, FeatureExtractor,
    HashingEmbedder, HeuristicAnalyzer, MemoryFeatures, TextAnalysis, TextAnalyzer, TextEmbedder,
};

#[cfg(feature = "embeddings")]
pub use features::LocalEmbedder;

// Relationships
pub use relationships::{ReasonTag, Relationship, RelationshipScorer, RelationshipType, ScoringWeights};

// Graph
pub use graph::{shortest_path, GraphBuilder, GraphError, GraphStats, MemoryPath, RelationshipGraph};

// Clusters
pub use clusters::{Cluster, ClusterCategory, ClusterDetector};

// Configuration
pub use config::EngineConfig;

// Storage layer
pub use storage::{MemoryStore, Result, SqliteStore, StorageError, UserRecord};

// Query service
pub use service::{
    parse_time_range, GraphQuery, GraphService, GraphView, ManualRelationInput, ServiceError,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default minimum relationship strength for graph queries
pub const DEFAULT_MIN_STRENGTH: f64 = 0.3;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Cluster, EngineConfig, GraphQuery, GraphService, GraphView, ManualRelationInput, Memory,
        MemoryPath, MemoryStore, Mood, NewMemory, RelationshipGraph, RelationshipType,
        ServiceError, SqliteStore, TimeRange,
    };

    pub use crate::{FeatureExtractor, HashingEmbedder, HeuristicAnalyzer, TextEmbedder};
}
