//! Cluster Detection
//!
//! Groups densely connected memories into thematic clusters:
//! - Louvain community detection over the relationship graph
//! - Isolated memories and single-member communities are left out
//! - Each cluster is labelled with ranked keywords, a theme, a life-area
//!   category, and the members' dominant mood

mod louvain;
mod theme;

pub use theme::{dominant_mood, rank_keywords, summarize, ClusterCategory};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::MemoryFeatures;
use crate::graph::RelationshipGraph;
use crate::memory::Mood;

/// Default number of keywords kept per cluster
pub const DEFAULT_KEYWORD_COUNT: usize = 5;

/// A group of related memories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub user_id: String,
    /// "Travel Memories #1"
    pub name: String,
    /// Top keyword across members
    pub theme: String,
    pub category: ClusterCategory,
    /// Members in graph order
    pub member_ids: Vec<String>,
    /// Ranked by document frequency
    pub keywords: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    pub fn contains(&self, memory_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == memory_id)
    }
}

/// Partitions a relationship graph into clusters
#[derive(Debug, Clone)]
pub struct ClusterDetector {
    keyword_count: usize,
    resolution: f64,
}

impl Default for ClusterDetector {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_COUNT, 1.0)
    }
}

impl ClusterDetector {
    pub fn new(keyword_count: usize, resolution: f64) -> Self {
        Self {
            keyword_count,
            resolution: if resolution > 0.0 { resolution } else { 1.0 },
        }
    }

    /// Detect clusters
    ///
    /// Sorted by member count descending, then theme ascending. An edgeless
    /// graph yields no clusters.
    pub fn detect(&self, graph: &RelationshipGraph, features: &[Arc<MemoryFeatures>]) -> Vec<Cluster> {
        if graph.edges.is_empty() {
            return vec![];
        }

        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.as_str(), i))
            .collect();
        let edges: Vec<(usize, usize, f64)> = graph
            .edges
            .iter()
            .filter_map(|e| {
                let a = *index.get(e.source_id.as_str())?;
                let b = *index.get(e.target_id.as_str())?;
                Some((a, b, e.strength))
            })
            .collect();

        let by_memory: HashMap<&str, &MemoryFeatures> = features
            .iter()
            .map(|f| (f.memory_id.as_str(), f.as_ref()))
            .collect();

        let now = Utc::now();
        let mut clusters: Vec<Cluster> = louvain::communities(graph.nodes.len(), &edges, self.resolution)
            .into_iter()
            .filter(|members| members.len() >= 2)
            .map(|members| self.label(graph, &members, &by_memory, now))
            .collect();

        clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.theme.cmp(&b.theme)));
        for (i, cluster) in clusters.iter_mut().enumerate() {
            cluster.name = format!("{} Memories #{}", cluster.category.label(), i + 1);
        }

        tracing::info!(
            user_id = %graph.user_id,
            clusters = clusters.len(),
            memories = graph.nodes.len(),
            "Detected clusters"
        );
        clusters
    }

    fn label(
        &self,
        graph: &RelationshipGraph,
        members: &[usize],
        features: &HashMap<&str, &MemoryFeatures>,
        now: DateTime<Utc>,
    ) -> Cluster {
        let memories: Vec<_> = members.iter().map(|&i| &graph.nodes[i]).collect();

        let ranked = rank_keywords(memories.iter().map(|m| {
            features
                .get(m.id.as_str())
                .map(|f| f.keywords.as_slice())
                .unwrap_or(&[])
        }));
        let mood = dominant_mood(memories.iter().map(|m| m.mood));
        let category = ClusterCategory::detect(&ranked, mood);
        let theme = ranked
            .first()
            .cloned()
            .unwrap_or_else(|| category.as_str().to_string());
        let keywords: Vec<String> = ranked.into_iter().take(self.keyword_count).collect();

        Cluster {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: graph.user_id.clone(),
            name: String::new(),
            theme,
            category,
            member_ids: memories.iter().map(|m| m.id.clone()).collect(),
            summary: summarize(memories.len(), category, &keywords),
            keywords,
            dominant_mood: mood,
            created_at: now,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;
    use crate::relationships::Relationship;

    fn build(
        specs: &[(&str, Option<Mood>, Vec<&str>)],
        edges: &[(&str, &str, f64)],
    ) -> (RelationshipGraph, Vec<Arc<MemoryFeatures>>) {
        let mut graph = RelationshipGraph::empty("u1");
        let mut features = Vec::new();
        for (id, mood, keywords) in specs {
            let mut m = Memory::new("u1", *id);
            m.id = id.to_string();
            m.mood = *mood;
            graph.nodes.push(m);
            let mut f = MemoryFeatures::degraded(*id, String::new(), 4);
            f.keywords = keywords.iter().map(|k| k.to_string()).collect();
            features.push(Arc::new(f));
        }
        graph.edges = edges
            .iter()
            .map(|(a, b, s)| Relationship::manual("u1", *a, *b, *s))
            .collect();
        graph.refresh_stats();
        (graph, features)
    }

    #[test]
    fn test_one_cluster_and_isolated_memories() {
        let (graph, features) = build(
            &[
                ("a", Some(Mood::Happy), vec!["hiking", "trail"]),
                ("b", Some(Mood::Happy), vec!["hiking", "lake"]),
                ("c", None, vec!["trail", "hiking", "trip"]),
                ("d", None, vec!["budget"]),
                ("e", Some(Mood::Sad), vec!["rain"]),
            ],
            &[("a", "b", 0.9), ("b", "c", 0.8), ("a", "c", 0.7)],
        );

        let clusters = ClusterDetector::default().detect(&graph, &features);
        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.member_ids, vec!["a", "b", "c"]);
        assert_eq!(cluster.theme, "hiking");
        assert_eq!(cluster.keywords, vec!["hiking", "trail", "lake", "trip"]);
        assert_eq!(cluster.category, ClusterCategory::Travel);
        assert_eq!(cluster.name, "Travel Memories #1");
        assert_eq!(cluster.dominant_mood, Some(Mood::Happy));
        assert!(!cluster.contains("d") && !cluster.contains("e"));
    }

    #[test]
    fn test_sorted_by_size_then_theme() {
        let (graph, features) = build(
            &[
                ("a", None, vec!["zebra"]),
                ("b", None, vec!["zebra"]),
                ("c", None, vec!["apple"]),
                ("d", None, vec!["apple"]),
                ("e", None, vec!["mango"]),
                ("f", None, vec!["mango"]),
                ("g", None, vec!["mango"]),
            ],
            &[
                ("a", "b", 0.9),
                ("c", "d", 0.9),
                ("e", "f", 0.9),
                ("f", "g", 0.9),
                ("e", "g", 0.9),
            ],
        );

        let clusters = ClusterDetector::default().detect(&graph, &features);
        let themes: Vec<&str> = clusters.iter().map(|c| c.theme.as_str()).collect();
        assert_eq!(themes, vec!["mango", "apple", "zebra"]);
        assert_eq!(clusters[0].name, "Life Memories #1");
        assert_eq!(clusters[2].name, "Life Memories #3");
    }

    #[test]
    fn test_keyword_count_limit_and_empty_graph() {
        let (graph, features) = build(
            &[
                ("a", None, vec!["one", "two", "three"]),
                ("b", None, vec!["four", "five", "six"]),
            ],
            &[("a", "b", 0.5)],
        );
        let clusters = ClusterDetector::new(2, 1.0).detect(&graph, &features);
        assert_eq!(clusters[0].keywords, vec!["one", "two"]);

        let empty = RelationshipGraph::empty("u1");
        assert!(ClusterDetector::default().detect(&empty, &[]).is_empty());
    }

    #[test]
    fn test_members_without_keywords_use_category_theme() {
        let (graph, features) = build(
            &[("a", Some(Mood::Sad), vec![]), ("b", Some(Mood::Sad), vec![])],
            &[("a", "b", 0.5)],
        );
        let clusters = ClusterDetector::default().detect(&graph, &features);
        assert_eq!(clusters[0].theme, "reflection");
        assert_eq!(
            clusters[0].summary,
            "A collection of 2 memories related to reflection"
        );
    }
}
