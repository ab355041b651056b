//! Relationships between memories
//!
//! A relationship is an undirected, weighted link between two memories of the
//! same user. Computed relationships are transient; manual ones are persisted
//! by storage and merged into every graph.

mod scorer;

pub use scorer::{RelationshipScorer, ScoringWeights};

use serde::{Deserialize, Serialize};

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// Dominant kind of a relationship
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Semantic,
    Temporal,
    EntityBased,
    SameMood,
    Manual,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Semantic => "semantic",
            RelationshipType::Temporal => "temporal",
            RelationshipType::EntityBased => "entity_based",
            RelationshipType::SameMood => "same_mood",
            RelationshipType::Manual => "manual",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Factor that contributed to a relationship's strength
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    SemanticSimilarity,
    TemporalProximity,
    SharedEntities,
    SameMood,
    ManualConnection,
}

impl ReasonTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonTag::SemanticSimilarity => "semantic_similarity",
            ReasonTag::TemporalProximity => "temporal_proximity",
            ReasonTag::SharedEntities => "shared_entities",
            ReasonTag::SameMood => "same_mood",
            ReasonTag::ManualConnection => "manual_connection",
        }
    }
}

impl std::fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RELATIONSHIP
// ============================================================================

/// Weighted link between two memories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    pub user_id: String,
    /// Sum of factor contributions, not clamped
    pub strength: f64,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Contributing factors in the order they fired
    pub reasons: Vec<ReasonTag>,
}

impl Relationship {
    /// A user-created relationship
    pub fn manual(
        user_id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        strength: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            user_id: user_id.into(),
            strength,
            kind: RelationshipType::Manual,
            reasons: vec![ReasonTag::ManualConnection],
        }
    }

    /// Whether this relationship links `a` and `b`, in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.target_id == b) || (self.source_id == b && self.target_id == a)
    }

    /// Order-independent key of the linked pair
    pub fn pair_key(&self) -> (String, String) {
        pair_key(&self.source_id, &self.target_id)
    }

    /// The endpoint opposite `id`, if `id` is an endpoint
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.source_id == id {
            Some(&self.target_id)
        } else if self.target_id == id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

/// Order-independent key for an unordered pair of memory ids
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
