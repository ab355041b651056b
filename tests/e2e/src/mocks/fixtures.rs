//! Test Data Factory
//!
//! Provides utilities for generating realistic journaling data:
//! - Memories with a chosen age, mood and tags
//! - Batch generation for stress and property tests
//! - Pre-built scenarios with known relationship structure

use std::collections::HashMap;

use chrono::{Duration, Utc};
use reverie_core::{Memory, Mood, NewMemory, SqliteStore};

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// db.register("ada");
///
/// // A single memory
/// let memory = TestDataFactory::create_memory(&db.store, "ada", "Went hiking with Sam");
///
/// // A pre-built scenario
/// let scenario = TestDataFactory::create_cluster_scenario(&db.store, "ada");
/// ```
pub struct TestDataFactory;

/// Scenario containing related test data
#[derive(Debug)]
pub struct TestScenario {
    /// IDs of created memories, in creation order
    pub memory_ids: Vec<String>,
    /// Description of the scenario
    pub description: String,
    /// Named memory ids for assertions
    pub metadata: HashMap<String, String>,
}

impl TestScenario {
    /// Id recorded under `key`
    pub fn id(&self, key: &str) -> &str {
        self.metadata
            .get(key)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("scenario has no memory named {key}"))
    }
}

/// Journal lines cycled by [`TestDataFactory::create_journal`]
const JOURNAL_LINES: &[(&str, Option<Mood>)] = &[
    ("Went hiking with Sam near the ridge", Some(Mood::Happy)),
    ("Long meeting about the Lisbon project deadline", Some(Mood::Angry)),
    ("Baked bread with Maria on a quiet morning", Some(Mood::Calm)),
    ("Flight to Porto delayed, stuck at the airport", Some(Mood::Sad)),
    ("Gym session with Jonas, new personal record", Some(Mood::Happy)),
    ("Reading by the window while rain kept falling", None),
    ("Hiking trip was amazing, Sam joined", Some(Mood::Happy)),
    ("Dinner with family, grandma told old stories", Some(Mood::Calm)),
    ("Project review with Maria went well", Some(Mood::Neutral)),
    ("Doctor appointment and a slow walk home", Some(Mood::Sad)),
];

impl TestDataFactory {
    // ========================================================================
    // SINGLE MEMORY CREATION
    // ========================================================================

    /// Create a memory written now
    pub fn create_memory(store: &SqliteStore, user_id: &str, text: &str) -> Memory {
        Self::create_memory_full(store, user_id, text, 0, None, vec![])
    }

    /// Create a memory written `days_ago` days ago with an optional mood
    pub fn create_memory_at(
        store: &SqliteStore,
        user_id: &str,
        text: &str,
        days_ago: i64,
        mood: Option<Mood>,
    ) -> Memory {
        Self::create_memory_full(store, user_id, text, days_ago, mood, vec![])
    }

    /// Create a memory with full configuration
    pub fn create_memory_full(
        store: &SqliteStore,
        user_id: &str,
        text: &str,
        days_ago: i64,
        mood: Option<Mood>,
        tags: Vec<&str>,
    ) -> Memory {
        let mut input = NewMemory::new(user_id, text)
            .at(Utc::now() - Duration::days(days_ago))
            .with_tags(tags.into_iter().map(String::from).collect());
        if let Some(mood) = mood {
            input = input.with_mood(mood);
        }
        store.insert_memory(input).expect("Failed to insert memory")
    }

    // ========================================================================
    // BATCH CREATION
    // ========================================================================

    /// Create `count` journal entries, one every `spacing_days` days going back
    /// from now, cycling through a fixed set of realistic lines
    pub fn create_journal(
        store: &SqliteStore,
        user_id: &str,
        count: usize,
        spacing_days: i64,
    ) -> Vec<Memory> {
        (0..count)
            .map(|i| {
                let (text, mood) = JOURNAL_LINES[i % JOURNAL_LINES.len()];
                Self::create_memory_at(store, user_id, text, i as i64 * spacing_days, mood)
            })
            .collect()
    }

    // ========================================================================
    // SCENARIOS
    // ========================================================================

    /// Two memories two days apart sharing the entity "Sam"
    pub fn create_shared_entity_scenario(store: &SqliteStore, user_id: &str) -> TestScenario {
        let first = Self::create_memory_at(store, user_id, "Went hiking with Sam", 2, None);
        let second =
            Self::create_memory_at(store, user_id, "Hiking trip was amazing, Sam joined", 0, None);

        scenario(
            "Temporal proximity plus a shared entity",
            [("first", first), ("second", second)],
        )
    }

    /// Two unrelated memories 60 days apart with different moods
    pub fn create_unrelated_scenario(store: &SqliteStore, user_id: &str) -> TestScenario {
        let old = Self::create_memory_at(
            store,
            user_id,
            "Filed quarterly taxes at the office",
            60,
            Some(Mood::Angry),
        );
        let recent = Self::create_memory_at(
            store,
            user_id,
            "Seashells scattered across the beach",
            0,
            Some(Mood::Calm),
        );

        scenario("Nothing in common", [("old", old), ("recent", recent)])
    }

    /// Three memories connected through "Sam" in the same week, plus two
    /// memories isolated in time, text and mood
    pub fn create_cluster_scenario(store: &SqliteStore, user_id: &str) -> TestScenario {
        let hike = Self::create_memory_at(store, user_id, "Went hiking with Sam", 0, None);
        let camp =
            Self::create_memory_at(store, user_id, "Camping near the lake with Sam", 1, None);
        let dinner = Self::create_memory_at(store, user_id, "Cooked dinner with Sam", 2, None);
        let taxes =
            Self::create_memory_at(store, user_id, "Filed quarterly taxes at the office", 120, None);
        let shells =
            Self::create_memory_at(store, user_id, "Seashells scattered across the beach", 240, None);

        scenario(
            "One connected trio and two isolated memories",
            [
                ("hike", hike),
                ("camp", camp),
                ("dinner", dinner),
                ("taxes", taxes),
                ("shells", shells),
            ],
        )
    }

    /// Three mutually unrelated memories far apart in time, to be chained
    /// with manual relationships
    pub fn create_chain_scenario(store: &SqliteStore, user_id: &str) -> TestScenario {
        let a = Self::create_memory_at(store, user_id, "Filed quarterly taxes at the office", 300, None);
        let c = Self::create_memory_at(store, user_id, "Painted the garden fence green", 150, None);
        let b = Self::create_memory_at(store, user_id, "Seashells scattered across the beach", 0, None);

        scenario("Three isolated memories", [("a", a), ("c", c), ("b", b)])
    }
}

fn scenario<const N: usize>(description: &str, named: [(&str, Memory); N]) -> TestScenario {
    let mut memory_ids = Vec::with_capacity(N);
    let mut metadata = HashMap::new();
    for (name, memory) in named {
        metadata.insert(name.to_string(), memory.id.clone());
        memory_ids.push(memory.id);
    }
    TestScenario {
        memory_ids,
        description: description.to_string(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestDatabaseManager;

    #[test]
    fn test_create_journal() {
        let db = TestDatabaseManager::new_temp();
        db.register("ada");
        let memories = TestDataFactory::create_journal(&db.store, "ada", 12, 3);
        assert_eq!(memories.len(), 12);
        assert_eq!(db.memory_count("ada"), 12);
        assert!(memories[0].created_at > memories[11].created_at);
    }

    #[test]
    fn test_scenario_metadata() {
        let db = TestDatabaseManager::new_temp();
        db.register("ada");
        let scenario = TestDataFactory::create_cluster_scenario(&db.store, "ada");
        assert_eq!(scenario.memory_ids.len(), 5);
        assert_eq!(scenario.id("hike"), scenario.memory_ids[0]);
    }
}
