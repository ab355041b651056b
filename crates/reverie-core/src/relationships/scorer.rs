//! Pairwise relationship scoring
//!
//! Four factors are applied in a fixed order, each adding to the strength:
//!
//! 1. semantic similarity above a threshold
//! 2. temporal proximity in whole days
//! 3. shared entities, per entity and uncapped
//! 4. identical mood
//!
//! Every type-setting factor overwrites the type set by the one before it, so
//! the displayed type follows entity_based > temporal > semantic. A pair linked
//! by mood alone is typed `same_mood`.

use serde::{Deserialize, Serialize};

use super::{ReasonTag, Relationship, RelationshipType};
use crate::features::{cosine_similarity, MemoryFeatures};
use crate::memory::Memory;

/// Weights and thresholds of the four scoring factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    /// Cosine similarity must exceed this to count
    pub semantic_threshold: f64,
    /// Multiplier applied to the similarity
    pub semantic_weight: f64,
    /// Day difference must be strictly below this
    pub temporal_window_days: i64,
    /// Fixed temporal contribution
    pub temporal_weight: f64,
    /// Contribution per shared entity
    pub entity_weight: f64,
    /// Fixed same-mood contribution
    pub mood_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic_threshold: 0.7,
            semantic_weight: 0.4,
            temporal_window_days: 7,
            temporal_weight: 0.3,
            entity_weight: 0.1,
            mood_weight: 0.2,
        }
    }
}

/// Scores one pair of memories
#[derive(Debug, Clone, Default)]
pub struct RelationshipScorer {
    weights: ScoringWeights,
}

impl RelationshipScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a pair. Always returns a relationship, possibly of strength 0.
    ///
    /// `a` becomes the source and `b` the target.
    pub fn score(
        &self,
        a: &Memory,
        fa: &MemoryFeatures,
        b: &Memory,
        fb: &MemoryFeatures,
    ) -> Relationship {
        let w = &self.weights;
        let mut strength = 0.0_f64;
        let mut reasons = Vec::new();
        let mut kind = None;

        let similarity = f64::from(cosine_similarity(&fa.embedding, &fb.embedding));
        if similarity > w.semantic_threshold {
            strength += similarity * w.semantic_weight;
            reasons.push(ReasonTag::SemanticSimilarity);
            kind = Some(RelationshipType::Semantic);
        }

        let days_apart = (a.created_at - b.created_at).num_days().abs();
        if days_apart < w.temporal_window_days {
            strength += w.temporal_weight;
            reasons.push(ReasonTag::TemporalProximity);
            kind = Some(RelationshipType::Temporal);
        }

        let shared = fa.entities.intersection(&fb.entities).count();
        if shared > 0 {
            strength += shared as f64 * w.entity_weight;
            reasons.push(ReasonTag::SharedEntities);
            kind = Some(RelationshipType::EntityBased);
        }

        if let (Some(ma), Some(mb)) = (a.mood, b.mood) {
            if ma == mb {
                strength += w.mood_weight;
                reasons.push(ReasonTag::SameMood);
                kind.get_or_insert(RelationshipType::SameMood);
            }
        }

        Relationship {
            source_id: a.id.clone(),
            target_id: b.id.clone(),
            user_id: a.user_id.clone(),
            strength,
            kind: kind.unwrap_or(RelationshipType::Semantic),
            reasons,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
