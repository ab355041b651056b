//! Cluster labelling: keyword ranking, life-area category, dominant mood

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::memory::Mood;

/// Coarse life area a cluster is about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClusterCategory {
    Work,
    Travel,
    Family,
    Friends,
    Health,
    Joy,
    Reflection,
    Life,
}

const KEYWORD_FAMILIES: &[(ClusterCategory, &[&str])] = &[
    (
        ClusterCategory::Work,
        &["work", "office", "meeting", "project", "colleague", "boss", "job"],
    ),
    (
        ClusterCategory::Travel,
        &["travel", "trip", "vacation", "flight", "hotel", "visit", "tourist"],
    ),
    (
        ClusterCategory::Family,
        &["family", "mom", "dad", "sister", "brother", "parent", "child"],
    ),
    (
        ClusterCategory::Friends,
        &["friend", "buddy", "pal", "hangout", "party", "fun"],
    ),
    (
        ClusterCategory::Health,
        &["health", "exercise", "gym", "doctor", "medical", "fitness", "wellness"],
    ),
];

impl ClusterCategory {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            ClusterCategory::Work => "Work",
            ClusterCategory::Travel => "Travel",
            ClusterCategory::Family => "Family",
            ClusterCategory::Friends => "Friends",
            ClusterCategory::Health => "Health",
            ClusterCategory::Joy => "Joy",
            ClusterCategory::Reflection => "Reflection",
            ClusterCategory::Life => "Life",
        }
    }

    /// First keyword family that matches, else a mood-based fallback
    pub fn detect(keywords: &[String], dominant_mood: Option<Mood>) -> Self {
        for (category, family) in KEYWORD_FAMILIES {
            if keywords.iter().any(|k| family.contains(&k.as_str())) {
                return *category;
            }
        }
        match dominant_mood {
            Some(Mood::Happy) => ClusterCategory::Joy,
            Some(Mood::Sad) => ClusterCategory::Reflection,
            _ => ClusterCategory::Life,
        }
    }

    /// Lowercase identifier, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterCategory::Work => "work",
            ClusterCategory::Travel => "travel",
            ClusterCategory::Family => "family",
            ClusterCategory::Friends => "friends",
            ClusterCategory::Health => "health",
            ClusterCategory::Joy => "joy",
            ClusterCategory::Reflection => "reflection",
            ClusterCategory::Life => "life",
        }
    }
}

impl std::str::FromStr for ClusterCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(ClusterCategory::Work),
            "travel" => Ok(ClusterCategory::Travel),
            "family" => Ok(ClusterCategory::Family),
            "friends" => Ok(ClusterCategory::Friends),
            "health" => Ok(ClusterCategory::Health),
            "joy" => Ok(ClusterCategory::Joy),
            "reflection" => Ok(ClusterCategory::Reflection),
            "life" => Ok(ClusterCategory::Life),
            _ => Err(format!("Unknown cluster category: {}", s)),
        }
    }
}

impl std::fmt::Display for ClusterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Keywords ranked by document frequency, ties by first-seen order
///
/// Each member contributes a keyword at most once.
pub fn rank_keywords<'a, I>(members: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: HashMap<&'a str, (usize, usize)> = HashMap::new();
    for keywords in members {
        let mut seen_here: Vec<&str> = Vec::new();
        for k in keywords {
            if seen_here.contains(&k.as_str()) {
                continue;
            }
            seen_here.push(k);
            let next = counts.len();
            counts.entry(k).or_insert((0, next)).0 += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(k, (n, first))| (k, n, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(k, _, _)| k.to_string()).collect()
}

/// Most common mood, ties by declaration order; `None` when no member has one
pub fn dominant_mood<I>(moods: I) -> Option<Mood>
where
    I: IntoIterator<Item = Option<Mood>>,
{
    let mut counts = [0usize; Mood::ALL.len()];
    for mood in moods.into_iter().flatten() {
        if let Some(i) = Mood::ALL.iter().position(|m| *m == mood) {
            counts[i] += 1;
        }
    }
    let mut best: Option<(usize, Mood)> = None;
    for (i, mood) in Mood::ALL.iter().enumerate() {
        if counts[i] > 0 && best.is_none_or(|(n, _)| counts[i] > n) {
            best = Some((counts[i], *mood));
        }
    }
    best.map(|(_, m)| m)
}

/// "A collection of 3 memories related to travel, featuring trip, lisbon, hotel"
pub fn summarize(member_count: usize, category: ClusterCategory, keywords: &[String]) -> String {
    let mut summary = format!(
        "A collection of {} memories related to {}",
        member_count,
        category.as_str()
    );
    if !keywords.is_empty() {
        let featured: Vec<&str> = keywords.iter().take(3).map(String::as_str).collect();
        summary.push_str(", featuring ");
        summary.push_str(&featured.join(", "));
    }
    summary
}
