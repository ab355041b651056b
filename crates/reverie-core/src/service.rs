//! Graph Query Service
//!
//! Orchestrates one request: validate input, load memories, extract features,
//! build the graph on a blocking worker, and optionally detect clusters.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::clusters::{Cluster, ClusterDetector};
use crate::config::EngineConfig;
use crate::features::{
    FeatureExtractor, HashingEmbedder, HeuristicAnalyzer, MemoryFeatures, TextAnalyzer,
    TextEmbedder,
};
use crate::graph::{shortest_path, GraphBuilder, GraphError, MemoryPath, RelationshipGraph};
use crate::memory::{Memory, TimeRange};
use crate::relationships::{Relationship, RelationshipScorer};
use crate::storage::{MemoryStore, StorageError};

// ============================================================================
// ERRORS
// ============================================================================

/// Errors surfaced to callers of the service
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Invalid time range: {0} (expected week, month, year or all)")]
    InvalidTimeRange(String),
    #[error("Invalid strength: {0} (expected a value within [0, 1])")]
    InvalidStrength(f64),
    #[error("Memory not found: {0}")]
    MemoryNotFound(String),
    #[error("A memory cannot be related to itself")]
    SelfRelationship,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl ServiceError {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::UnknownUser(_) => "unknown_user",
            ServiceError::InvalidTimeRange(_) => "invalid_time_range",
            ServiceError::InvalidStrength(_) => "invalid_strength",
            ServiceError::MemoryNotFound(_) => "memory_not_found",
            ServiceError::SelfRelationship => "self_relationship",
            ServiceError::Graph(GraphError::Cancelled) => "cancelled",
            ServiceError::Graph(GraphError::DimensionMismatch { .. }) => "dimension_mismatch",
            ServiceError::Storage(_) => "storage_unavailable",
            ServiceError::Worker(_) => "worker_failed",
        }
    }

    /// Whether the caller can fix the request
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ServiceError::UnknownUser(_)
                | ServiceError::InvalidTimeRange(_)
                | ServiceError::InvalidStrength(_)
                | ServiceError::MemoryNotFound(_)
                | ServiceError::SelfRelationship
        )
    }
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Parameters of a graph query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphQuery {
    pub time_range: TimeRange,
    /// Falls back to the configured default when absent
    pub min_strength: Option<f64>,
    pub include_clusters: bool,
}

impl GraphQuery {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            ..Default::default()
        }
    }

    pub fn min_strength(mut self, min_strength: f64) -> Self {
        self.min_strength = Some(min_strength);
        self
    }

    pub fn with_clusters(mut self) -> Self {
        self.include_clusters = true;
        self
    }
}

/// Graph plus optional clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    #[serde(flatten)]
    pub graph: RelationshipGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<Vec<Cluster>>,
}

/// A user-asserted relationship
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ManualRelationInput {
    pub source_id: String,
    pub target_id: String,
    pub strength: f64,
}

/// Parse a time range name, mapping failures to [`ServiceError::InvalidTimeRange`]
pub fn parse_time_range(value: &str) -> Result<TimeRange, ServiceError> {
    value
        .parse()
        .map_err(|_| ServiceError::InvalidTimeRange(value.to_string()))
}

/// Manual edges on the path graph only need a positive strength
const MANUAL_PATH_FLOOR: f64 = 0.0;

fn validate_strength(strength: f64) -> Result<f64, ServiceError> {
    if strength.is_finite() && (0.0..=1.0).contains(&strength) {
        Ok(strength)
    } else {
        Err(ServiceError::InvalidStrength(strength))
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Query boundary of the relationship engine
pub struct GraphService {
    store: Arc<dyn MemoryStore>,
    extractor: Arc<FeatureExtractor>,
    builder: GraphBuilder,
    detector: ClusterDetector,
    config: EngineConfig,
}

impl GraphService {
    /// Service with injected capabilities
    pub fn new(
        store: Arc<dyn MemoryStore>,
        embedder: Arc<dyn TextEmbedder>,
        analyzer: Arc<dyn TextAnalyzer>,
        config: EngineConfig,
    ) -> Self {
        let extractor = FeatureExtractor::new(
            embedder,
            analyzer,
            config.feature_cache_capacity,
            config.extraction_concurrency,
        );
        Self {
            store,
            extractor: Arc::new(extractor),
            builder: GraphBuilder::new(RelationshipScorer::new(config.scoring.clone())),
            detector: ClusterDetector::new(config.cluster_keyword_count, config.louvain_resolution),
            config,
        }
    }

    /// Service with the hashing embedder and heuristic analyzer
    pub fn with_defaults(store: Arc<dyn MemoryStore>, config: EngineConfig) -> Self {
        let embedder = Arc::new(HashingEmbedder::new(config.embedding_dimensions));
        Self::new(store, embedder, Arc::new(HeuristicAnalyzer::new()), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Drop cached features of an edited or deleted memory
    pub fn invalidate(&self, memory_id: &str) {
        self.extractor.invalidate(memory_id);
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Relationship graph of a user's memories
    pub async fn graph(
        &self,
        user_id: &str,
        query: &GraphQuery,
        cancel: &CancellationToken,
    ) -> Result<GraphView, ServiceError> {
        let min_strength = self.resolve_strength(query.min_strength)?;
        self.ensure_user(user_id)?;

        let (graph, clusters) = self
            .compute(
                user_id,
                query.time_range,
                min_strength,
                min_strength,
                query.include_clusters,
                cancel,
            )
            .await?;

        Ok(GraphView { graph, clusters })
    }

    /// Detect clusters and replace the user's persisted clusters
    pub async fn detect_clusters(
        &self,
        user_id: &str,
        time_range: TimeRange,
        min_strength: Option<f64>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Cluster>, ServiceError> {
        let min_strength = self.resolve_strength(min_strength)?;
        self.ensure_user(user_id)?;

        let (_, clusters) = self
            .compute(user_id, time_range, min_strength, min_strength, true, cancel)
            .await?;
        let clusters = clusters.unwrap_or_default();

        self.store.replace_clusters(user_id, &clusters)?;
        tracing::info!(user_id, clusters = clusters.len(), "Persisted clusters");
        Ok(clusters)
    }

    /// Last persisted clusters
    pub fn stored_clusters(&self, user_id: &str) -> Result<Vec<Cluster>, ServiceError> {
        self.ensure_user(user_id)?;
        Ok(self.store.clusters(user_id)?)
    }

    /// Persist a manual relationship, bypassing the scorer
    pub fn relate(
        &self,
        user_id: &str,
        input: ManualRelationInput,
    ) -> Result<Relationship, ServiceError> {
        let strength = validate_strength(input.strength)?;
        if input.source_id == input.target_id {
            return Err(ServiceError::SelfRelationship);
        }
        self.ensure_user(user_id)?;
        self.owned_memory(user_id, &input.source_id)?;
        self.owned_memory(user_id, &input.target_id)?;

        let relationship = Relationship::manual(user_id, input.source_id, input.target_id, strength);
        self.store.save_manual_relationship(&relationship)?;
        tracing::info!(
            user_id,
            source = %relationship.source_id,
            target = %relationship.target_id,
            strength,
            "Saved manual relationship"
        );
        Ok(relationship)
    }

    /// Cheapest path between two memories over the user's full graph
    ///
    /// Computed edges must reach the configured default strength. Every
    /// saved manual relationship is walkable regardless of its strength.
    pub async fn path(
        &self,
        user_id: &str,
        source_id: &str,
        target_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<MemoryPath>, ServiceError> {
        self.ensure_user(user_id)?;
        self.owned_memory(user_id, source_id)?;
        self.owned_memory(user_id, target_id)?;

        let (graph, _) = self
            .compute(
                user_id,
                TimeRange::All,
                self.config.default_min_strength,
                MANUAL_PATH_FLOOR,
                false,
                cancel,
            )
            .await?;

        Ok(shortest_path(&graph, source_id, target_id))
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn resolve_strength(&self, requested: Option<f64>) -> Result<f64, ServiceError> {
        match requested {
            Some(s) => validate_strength(s),
            None => Ok(self.config.default_min_strength),
        }
    }

    fn ensure_user(&self, user_id: &str) -> Result<(), ServiceError> {
        if self.store.user_exists(user_id)? {
            Ok(())
        } else {
            Err(ServiceError::UnknownUser(user_id.to_string()))
        }
    }

    fn owned_memory(&self, user_id: &str, memory_id: &str) -> Result<Memory, ServiceError> {
        match self.store.get_memory(memory_id)? {
            Some(m) if m.user_id == user_id => Ok(m),
            _ => Err(ServiceError::MemoryNotFound(memory_id.to_string())),
        }
    }

    async fn compute(
        &self,
        user_id: &str,
        time_range: TimeRange,
        min_strength: f64,
        manual_min_strength: f64,
        include_clusters: bool,
        cancel: &CancellationToken,
    ) -> Result<(RelationshipGraph, Option<Vec<Cluster>>), ServiceError> {
        let memories = self
            .store
            .memories_for_user(user_id, time_range.since(Utc::now()))?;
        let manual = self.store.manual_relationships(user_id)?;

        let features: Vec<Arc<MemoryFeatures>> = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GraphError::Cancelled.into()),
            features = self.extractor.extract_all(&memories) => features,
        };

        let degraded = features.iter().filter(|f| f.degraded).count();
        if degraded > 0 {
            tracing::warn!(user_id, degraded, "Some memories use fallback features");
        }

        let builder = self.builder.clone();
        let detector = self.detector.clone();
        let user = user_id.to_string();
        let token = cancel.clone();

        tokio::task::spawn_blocking(move || {
            let graph = builder.build(&user, &memories, &features, min_strength, &token)?;
            let graph = GraphBuilder::with_manual(graph, &manual, manual_min_strength);
            if token.is_cancelled() {
                return Err(GraphError::Cancelled);
            }
            let clusters = include_clusters.then(|| detector.detect(&graph, &features));
            Ok((graph, clusters))
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))?
        .map_err(ServiceError::from)
    }
}

// ============================================================================
// TESTS
// ============================================================================
