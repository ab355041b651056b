//! All-pairs graph construction
//!
//! Pure CPU work. Callers on an async runtime run it through
//! `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{GraphError, GraphStats, RelationshipGraph};
use crate::features::MemoryFeatures;
use crate::memory::Memory;
use crate::relationships::{pair_key, Relationship, RelationshipScorer};

/// Builds relationship graphs from memories and their features
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    scorer: RelationshipScorer,
}

impl GraphBuilder {
    pub fn new(scorer: RelationshipScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &RelationshipScorer {
        &self.scorer
    }

    /// Score every unordered pair once and keep those at or above `min_strength`
    ///
    /// `features[i]` must belong to `memories[i]`. Pairs are visited in input
    /// order with the earlier memory as source. The token is checked once per
    /// outer row; a cancelled build returns no partial graph.
    pub fn build(
        &self,
        user_id: &str,
        memories: &[Memory],
        features: &[Arc<MemoryFeatures>],
        min_strength: f64,
        cancel: &CancellationToken,
    ) -> Result<RelationshipGraph, GraphError> {
        check_dimensions(features)?;

        let n = memories.len().min(features.len());
        let mut edges = Vec::new();

        for i in 0..n {
            if cancel.is_cancelled() {
                tracing::debug!(user_id, row = i, "Graph build cancelled");
                return Err(GraphError::Cancelled);
            }
            for j in (i + 1)..n {
                let rel = self
                    .scorer
                    .score(&memories[i], &features[i], &memories[j], &features[j]);
                if qualifies(rel.strength, min_strength) {
                    edges.push(rel);
                }
            }
        }

        let nodes = memories[..n].to_vec();
        let stats = GraphStats::compute(&nodes, &edges);
        tracing::debug!(
            user_id,
            memories = stats.total_memories,
            connections = stats.total_connections,
            min_strength,
            "Built relationship graph"
        );

        Ok(RelationshipGraph {
            user_id: user_id.to_string(),
            nodes,
            edges,
            stats,
        })
    }

    /// Merge manual relationships into a built graph
    ///
    /// A manual edge replaces a computed edge on the same pair and is subject
    /// to the same `min_strength` filter. Edges to memories outside the graph
    /// are skipped.
    pub fn with_manual(
        mut graph: RelationshipGraph,
        manual: &[Relationship],
        min_strength: f64,
    ) -> RelationshipGraph {
        let mut positions: HashMap<(String, String), usize> = graph
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.pair_key(), i))
            .collect();

        let mut dropped = Vec::new();
        for rel in manual {
            let present = graph.node_index(&rel.source_id).is_some()
                && graph.node_index(&rel.target_id).is_some();
            if !present {
                continue;
            }

            let key = pair_key(&rel.source_id, &rel.target_id);
            let keep = qualifies(rel.strength, min_strength);
            match positions.get(&key) {
                Some(&i) if keep => graph.edges[i] = rel.clone(),
                Some(&i) => dropped.push(i),
                None if keep => {
                    positions.insert(key, graph.edges.len());
                    graph.edges.push(rel.clone());
                }
                None => {}
            }
        }

        if !dropped.is_empty() {
            let mut index = 0;
            graph.edges.retain(|_| {
                let keep = !dropped.contains(&index);
                index += 1;
                keep
            });
        }

        graph.refresh_stats();
        graph
    }
}

fn qualifies(strength: f64, min_strength: f64) -> bool {
    strength > 0.0 && strength >= min_strength
}

fn check_dimensions(features: &[Arc<MemoryFeatures>]) -> Result<(), GraphError> {
    let Some(first) = features.first() else {
        return Ok(());
    };
    let expected = first.dimensions();
    match features.iter().find(|f| f.dimensions() != expected) {
        Some(f) => Err(GraphError::DimensionMismatch {
            expected,
            found: f.dimensions(),
            memory_id: f.memory_id.clone(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
