//! Engine configuration
//!
//! Explicit, passed in by the caller. `from_env` layers `REVERIE_*`
//! environment variables over the defaults.

use serde::{Deserialize, Serialize};

use crate::clusters::DEFAULT_KEYWORD_COUNT;
use crate::features::DEFAULT_DIMENSIONS;
use crate::relationships::ScoringWeights;
use crate::DEFAULT_MIN_STRENGTH;

/// Tunables for the relationship engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Minimum strength when a query does not set one
    pub default_min_strength: f64,
    /// Keywords kept per cluster
    pub cluster_keyword_count: usize,
    /// Entries in the feature cache
    pub feature_cache_capacity: usize,
    /// Concurrent embedding calls per query
    pub extraction_concurrency: usize,
    /// Dimensions of the default hashing embedder
    pub embedding_dimensions: usize,
    /// Louvain resolution; above 1 favours smaller clusters
    pub louvain_resolution: f64,
    pub scoring: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_min_strength: DEFAULT_MIN_STRENGTH,
            cluster_keyword_count: DEFAULT_KEYWORD_COUNT,
            feature_cache_capacity: 1024,
            extraction_concurrency: 8,
            embedding_dimensions: DEFAULT_DIMENSIONS,
            louvain_resolution: 1.0,
            scoring: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `REVERIE_*` environment variables
    ///
    /// Unparseable or out-of-range values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse::<f64, _>(&lookup, "REVERIE_MIN_STRENGTH") {
            if (0.0..=1.0).contains(&v) {
                config.default_min_strength = v;
            } else {
                tracing::warn!("REVERIE_MIN_STRENGTH must be within [0, 1], got {}", v);
            }
        }
        if let Some(v) = parse(&lookup, "REVERIE_CLUSTER_KEYWORDS") {
            config.cluster_keyword_count = v;
        }
        if let Some(v) = parse::<usize, _>(&lookup, "REVERIE_FEATURE_CACHE") {
            config.feature_cache_capacity = v.max(1);
        }
        if let Some(v) = parse::<usize, _>(&lookup, "REVERIE_EXTRACTION_CONCURRENCY") {
            config.extraction_concurrency = v.max(1);
        }
        if let Some(v) = parse::<usize, _>(&lookup, "REVERIE_EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions = v.max(1);
        }

        config
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
