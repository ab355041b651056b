//! Journey tests: journaling scenarios end to end
//!
//! Each test seeds a temporary database, runs the query service and checks
//! the relationships, clusters and paths a user would see.

use reverie_core::{
    GraphQuery, ManualRelationInput, ReasonTag, RelationshipType, ServiceError, TimeRange,
};
use reverie_e2e_tests::harness::TestDatabaseManager;
use reverie_e2e_tests::mocks::TestDataFactory;
use tokio_util::sync::CancellationToken;

const EPSILON: f64 = 1e-9;

fn token() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
async fn test_shared_entity_within_a_week_is_entity_based() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_shared_entity_scenario(&db.store, "ada");

    let view = db
        .service
        .graph("ada", &GraphQuery::default(), &token())
        .await
        .unwrap();

    assert_eq!(view.graph.edges.len(), 1, "{}", scenario.description);
    let edge = &view.graph.edges[0];
    assert!(edge.connects(scenario.id("first"), scenario.id("second")));
    assert!(edge.strength >= 0.4 - EPSILON);
    assert_eq!(edge.kind, RelationshipType::EntityBased);
    assert!(edge.reasons.contains(&ReasonTag::TemporalProximity));
    assert!(edge.reasons.contains(&ReasonTag::SharedEntities));
    assert!(!edge.reasons.contains(&ReasonTag::SameMood));
}

#[tokio::test]
async fn test_unrelated_memories_produce_no_relationship() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    TestDataFactory::create_unrelated_scenario(&db.store, "ada");

    let view = db
        .service
        .graph("ada", &GraphQuery::default(), &token())
        .await
        .unwrap();

    assert_eq!(view.graph.nodes.len(), 2);
    assert!(view.graph.edges.is_empty());
    assert_eq!(view.graph.stats.total_connections, 0);
    assert_eq!(view.graph.stats.avg_connection_strength, 0.0);
}

#[tokio::test]
async fn test_one_cluster_of_three_with_isolated_memories_left_out() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_cluster_scenario(&db.store, "ada");

    let clusters = db
        .service
        .detect_clusters("ada", TimeRange::All, Some(0.3), &token())
        .await
        .unwrap();

    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(cluster.len(), 3);
    for key in ["hike", "camp", "dinner"] {
        assert!(cluster.contains(scenario.id(key)), "{} missing", key);
    }
    for key in ["taxes", "shells"] {
        assert!(!cluster.contains(scenario.id(key)), "{} clustered", key);
    }
    assert_eq!(cluster.name, format!("{} Memories #1", cluster.category.label()));
    assert!(cluster.summary.starts_with("A collection of 3 memories related to"));

    // Detection persists what it found
    let stored = db.service.stored_clusters("ada").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, cluster.id);
    assert_eq!(stored[0].member_ids, cluster.member_ids);
    assert_eq!(stored[0].summary, cluster.summary);
}

#[tokio::test]
async fn test_time_range_limits_the_graph() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    TestDataFactory::create_cluster_scenario(&db.store, "ada");

    let week = db
        .service
        .graph("ada", &GraphQuery::new(TimeRange::Week), &token())
        .await
        .unwrap();
    let all = db
        .service
        .graph("ada", &GraphQuery::new(TimeRange::All), &token())
        .await
        .unwrap();

    assert_eq!(week.graph.nodes.len(), 3);
    assert_eq!(all.graph.nodes.len(), 5);
    assert_eq!(week.graph.edges.len(), all.graph.edges.len());
}

#[tokio::test]
async fn test_manual_relationship_survives_recomputation() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_unrelated_scenario(&db.store, "ada");
    let (old, recent) = (scenario.id("old"), scenario.id("recent"));

    let saved = db
        .service
        .relate(
            "ada",
            ManualRelationInput {
                source_id: old.to_string(),
                target_id: recent.to_string(),
                strength: 0.8,
            },
        )
        .unwrap();
    assert_eq!(saved.kind, RelationshipType::Manual);
    assert_eq!(saved.reasons, vec![ReasonTag::ManualConnection]);

    for _ in 0..2 {
        for id in &scenario.memory_ids {
            db.service.invalidate(id);
        }
        let view = db
            .service
            .graph("ada", &GraphQuery::default(), &token())
            .await
            .unwrap();

        assert_eq!(view.graph.edges.len(), 1);
        let edge = &view.graph.edges[0];
        assert!(edge.connects(old, recent));
        assert_eq!(edge.kind, RelationshipType::Manual);
        assert!((edge.strength - 0.8).abs() < EPSILON);
    }
}

#[tokio::test]
async fn test_relating_again_replaces_the_manual_strength() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_unrelated_scenario(&db.store, "ada");
    let (old, recent) = (scenario.id("old"), scenario.id("recent"));

    for (source, target, strength) in [(old, recent, 0.8), (recent, old, 0.5)] {
        db.service
            .relate(
                "ada",
                ManualRelationInput {
                    source_id: source.to_string(),
                    target_id: target.to_string(),
                    strength,
                },
            )
            .unwrap();
    }

    let view = db
        .service
        .graph("ada", &GraphQuery::default(), &token())
        .await
        .unwrap();
    assert_eq!(view.graph.edges.len(), 1);
    assert!((view.graph.edges[0].strength - 0.5).abs() < EPSILON);
}

#[tokio::test]
async fn test_path_through_intermediate_memory() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_chain_scenario(&db.store, "ada");
    let (a, b, c) = (scenario.id("a"), scenario.id("b"), scenario.id("c"));

    for (source, target) in [(a, c), (c, b)] {
        db.service
            .relate(
                "ada",
                ManualRelationInput {
                    source_id: source.to_string(),
                    target_id: target.to_string(),
                    strength: 0.5,
                },
            )
            .unwrap();
    }

    let path = db.service.path("ada", a, b, &token()).await.unwrap().unwrap();
    assert_eq!(path.memory_ids, vec![a.to_string(), c.to_string(), b.to_string()]);
    assert_eq!(path.hops, 2);
    assert!((path.total_cost - 4.0).abs() < EPSILON);
}

#[tokio::test]
async fn test_path_between_disconnected_memories_is_none() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_chain_scenario(&db.store, "ada");

    let path = db
        .service
        .path("ada", scenario.id("a"), scenario.id("b"), &token())
        .await
        .unwrap();
    assert!(path.is_none());
}

#[tokio::test]
async fn test_memories_of_other_users_are_invisible() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    db.register("bob");
    let ada = TestDataFactory::create_unrelated_scenario(&db.store, "ada");
    let bob = TestDataFactory::create_memory(&db.store, "bob", "Went hiking with Sam");

    let err = db
        .service
        .relate(
            "ada",
            ManualRelationInput {
                source_id: ada.id("old").to_string(),
                target_id: bob.id.clone(),
                strength: 0.9,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::MemoryNotFound(_)));

    let view = db
        .service
        .graph("bob", &GraphQuery::default(), &token())
        .await
        .unwrap();
    assert_eq!(view.graph.nodes.len(), 1);
}

#[tokio::test]
async fn test_deleting_a_memory_drops_its_manual_relationships() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_chain_scenario(&db.store, "ada");
    let (a, c) = (scenario.id("a"), scenario.id("c"));

    db.service
        .relate(
            "ada",
            ManualRelationInput {
                source_id: a.to_string(),
                target_id: c.to_string(),
                strength: 0.9,
            },
        )
        .unwrap();
    assert!(db.store.delete_memory(c).unwrap());
    db.service.invalidate(c);

    let view = db
        .service
        .graph("ada", &GraphQuery::default(), &token())
        .await
        .unwrap();
    assert_eq!(view.graph.nodes.len(), 2);
    assert!(view.graph.edges.is_empty());
}

#[tokio::test]
async fn test_weak_manual_link_still_connects_a_path() {
    let db = TestDatabaseManager::new_temp();
    db.register("ada");
    let scenario = TestDataFactory::create_chain_scenario(&db.store, "ada");
    let (a, c) = (scenario.id("a"), scenario.id("c"));

    db.service
        .relate(
            "ada",
            ManualRelationInput {
                source_id: a.to_string(),
                target_id: c.to_string(),
                strength: 0.2,
            },
        )
        .unwrap();

    // Visible only below the default threshold
    let low = db
        .service
        .graph("ada", &GraphQuery::default().min_strength(0.1), &token())
        .await
        .unwrap();
    assert_eq!(low.graph.edges.len(), 1);
    let default_view = db
        .service
        .graph("ada", &GraphQuery::default(), &token())
        .await
        .unwrap();
    assert!(default_view.graph.edges.is_empty());

    let path = db.service.path("ada", a, c, &token()).await.unwrap().unwrap();
    assert_eq!(path.memory_ids, vec![a.to_string(), c.to_string()]);
    assert!((path.total_cost - 5.0).abs() < EPSILON);
}
