//! Memory module - Journal entry types
//!
//! - Journal entries (memories) as supplied by the storage collaborator
//! - Closed mood enumeration
//! - Time-range filters for graph queries

mod entry;

pub use entry::{Memory, NewMemory};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// MOOD
// ============================================================================

/// Mood label attached to a journal entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Calm,
    Neutral,
}

impl Mood {
    /// All moods in declaration order
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Sad, Mood::Angry, Mood::Calm, Mood::Neutral];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "angry" => Ok(Mood::Angry),
            "calm" => Ok(Mood::Calm),
            "neutral" => Ok(Mood::Neutral),
            _ => Err(format!("Unknown mood: {}", s)),
        }
    }
}

// ============================================================================
// TIME RANGE
// ============================================================================

/// Time window for graph queries, relative to "now"
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Created within the last 7 days
    Week,
    /// Created within the last 30 days
    Month,
    /// Created within the last 365 days
    Year,
    /// No time filter
    #[default]
    All,
}

impl TimeRange {
    /// Window length in days, `None` for unbounded
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::Year => Some(365),
            TimeRange::All => None,
        }
    }

    /// Earliest creation time included by this range
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|d| now - Duration::days(d))
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
            TimeRange::All => "all",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            _ => Err(format!("Unknown time range: {}", s)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
