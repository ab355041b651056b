//! Relationship Graph
//!
//! Undirected weighted graph over one user's memories:
//! - Nodes are the memories in the requested time window
//! - Edges are relationships at or above the caller's minimum strength
//! - Manual relationships are merged on top of computed ones

mod builder;
mod path;

pub use builder::GraphBuilder;
pub use path::{shortest_path, MemoryPath};

use serde::{Deserialize, Serialize};

use crate::memory::Memory;
use crate::relationships::Relationship;

// ============================================================================
// ERRORS
// ============================================================================

/// Graph building errors
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Features from different embedding models were mixed in one run
    #[error("Embedding dimension mismatch: expected {expected}, found {found} (memory {memory_id})")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        memory_id: String,
    },
    /// The caller cancelled the computation
    #[error("Graph computation cancelled")]
    Cancelled,
}

// ============================================================================
// GRAPH
// ============================================================================

/// Aggregate statistics of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_memories: usize,
    pub total_connections: usize,
    /// Mean edge strength, 0 when there are no edges
    pub avg_connection_strength: f64,
}

impl GraphStats {
    pub fn compute(nodes: &[Memory], edges: &[Relationship]) -> Self {
        let avg = if edges.is_empty() {
            0.0
        } else {
            edges.iter().map(|e| e.strength).sum::<f64>() / edges.len() as f64
        };
        Self {
            total_memories: nodes.len(),
            total_connections: edges.len(),
            avg_connection_strength: avg,
        }
    }
}

/// A user's relationship graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipGraph {
    pub user_id: String,
    pub nodes: Vec<Memory>,
    pub edges: Vec<Relationship>,
    pub stats: GraphStats,
}

impl RelationshipGraph {
    /// Graph with no nodes or edges
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nodes: vec![],
            edges: vec![],
            stats: GraphStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a memory in `nodes`
    pub fn node_index(&self, memory_id: &str) -> Option<usize> {
        self.nodes.iter().position(|m| m.id == memory_id)
    }

    /// Edges touching a memory
    pub fn edges_of<'a>(&'a self, memory_id: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source_id == memory_id || e.target_id == memory_id)
    }

    /// Recompute stats after editing nodes or edges
    pub fn refresh_stats(&mut self) {
        self.stats = GraphStats::compute(&self.nodes, &self.edges);
    }
}
