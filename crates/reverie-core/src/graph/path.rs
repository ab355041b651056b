//! Shortest path between two memories
//!
//! Dijkstra over the undirected graph with edge cost `1 / strength`, so strong
//! relationships are short hops.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::RelationshipGraph;

/// A path through the relationship graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPath {
    /// Memory ids from source to target, inclusive
    pub memory_ids: Vec<String>,
    /// Sum of `1 / strength` over traversed edges
    pub total_cost: f64,
    /// Number of edges traversed
    pub hops: usize,
}

/// Min-heap entry; ties resolve toward the lower node index
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    node: usize,
    cost: f64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Cheapest path from `source_id` to `target_id`
///
/// Returns `None` when either memory is not in the graph or they are not
/// connected. A memory's path to itself is just that memory.
pub fn shortest_path(
    graph: &RelationshipGraph,
    source_id: &str,
    target_id: &str,
) -> Option<MemoryPath> {
    let source = graph.node_index(source_id)?;
    let target = graph.node_index(target_id)?;

    if source == target {
        return Some(MemoryPath {
            memory_ids: vec![source_id.to_string()],
            total_cost: 0.0,
            hops: 0,
        });
    }

    let n = graph.nodes.len();
    let index: std::collections::HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id.as_str(), i))
        .collect();

    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for edge in &graph.edges {
        if edge.strength <= 0.0 {
            continue;
        }
        let (Some(&a), Some(&b)) = (
            index.get(edge.source_id.as_str()),
            index.get(edge.target_id.as_str()),
        ) else {
            continue;
        };
        let cost = 1.0 / edge.strength;
        adjacency[a].push((b, cost));
        adjacency[b].push((a, cost));
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    heap.push(QueueEntry { node: source, cost: 0.0 });

    while let Some(QueueEntry { node, cost }) = heap.pop() {
        if node == target {
            break;
        }
        if cost > dist[node] {
            continue;
        }
        for &(next, weight) in &adjacency[node] {
            let candidate = cost + weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = Some(node);
                heap.push(QueueEntry { node: next, cost: candidate });
            }
        }
    }

    if dist[target].is_infinite() {
        return None;
    }

    let mut indices = vec![target];
    let mut current = target;
    while let Some(p) = prev[current] {
        indices.push(p);
        current = p;
    }
    indices.reverse();

    Some(MemoryPath {
        hops: indices.len() - 1,
        memory_ids: indices.into_iter().map(|i| graph.nodes[i].id.clone()).collect(),
        total_cost: dist[target],
    })
}
