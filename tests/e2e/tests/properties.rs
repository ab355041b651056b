//! Property tests over realistic journals
//!
//! Score symmetry, threshold monotonicity, determinism, extraction
//! idempotence and the single-memory boundary.

use std::collections::BTreeSet;

use reverie_core::{GraphBuilder, GraphQuery, MemoryStore, RelationshipScorer, TimeRange};
use reverie_e2e_tests::harness::TestDatabaseManager;
use reverie_e2e_tests::mocks::TestDataFactory;
use tokio_util::sync::CancellationToken;

const USER: &str = "ada";

fn seeded(count: usize, spacing_days: i64) -> TestDatabaseManager {
    let db = TestDatabaseManager::new_temp();
    db.register(USER);
    TestDataFactory::create_journal(&db.store, USER, count, spacing_days);
    db
}

fn edge_set(edges: &[reverie_core::Relationship]) -> BTreeSet<(String, String)> {
    edges.iter().map(|e| e.pair_key()).collect()
}

#[tokio::test]
async fn test_score_is_symmetric() {
    let db = seeded(10, 1);
    let memories = db.store.memories_for_user(USER, None).unwrap();
    let features = db.service.extractor().extract_all(&memories).await;
    let scorer = RelationshipScorer::default();

    for i in 0..memories.len() {
        for j in (i + 1)..memories.len() {
            let ab = scorer.score(&memories[i], &features[i], &memories[j], &features[j]);
            let ba = scorer.score(&memories[j], &features[j], &memories[i], &features[i]);
            assert_eq!(ab.strength, ba.strength, "pair {} {}", i, j);
            assert_eq!(ab.reasons, ba.reasons);
            assert_eq!(ab.kind, ba.kind);
        }
    }
}

#[tokio::test]
async fn test_higher_threshold_yields_subset() {
    let db = seeded(20, 2);
    let thresholds = [0.0, 0.1, 0.3, 0.4, 0.5, 0.7, 0.9, 1.0];

    let mut previous: Option<BTreeSet<(String, String)>> = None;
    for t in thresholds {
        let view = db
            .service
            .graph(USER, &GraphQuery::default().min_strength(t), &CancellationToken::new())
            .await
            .unwrap();
        let current = edge_set(&view.graph.edges);
        assert!(view.graph.edges.iter().all(|e| e.strength >= t && e.strength > 0.0));
        if let Some(prev) = &previous {
            assert!(current.is_subset(prev), "threshold {} not a subset", t);
        }
        previous = Some(current);
    }
}

#[tokio::test]
async fn test_build_is_deterministic() {
    let db = seeded(15, 1);
    let memories = db.store.memories_for_user(USER, None).unwrap();
    let features = db.service.extractor().extract_all(&memories).await;
    let builder = GraphBuilder::default();
    let token = CancellationToken::new();

    let first = builder.build(USER, &memories, &features, 0.3, &token).unwrap();
    let second = builder.build(USER, &memories, &features, 0.3, &token).unwrap();

    assert_eq!(
        serde_json::to_string(&first.edges).unwrap(),
        serde_json::to_string(&second.edges).unwrap()
    );
}

#[tokio::test]
async fn test_clusters_are_deterministic() {
    let db = seeded(15, 1);
    let token = CancellationToken::new();
    let query = GraphQuery::new(TimeRange::All).with_clusters();

    let first = db.service.graph(USER, &query, &token).await.unwrap();
    let second = db.service.graph(USER, &query, &token).await.unwrap();

    let members = |view: &reverie_core::GraphView| -> Vec<Vec<String>> {
        view.clusters
            .iter()
            .flatten()
            .map(|c| c.member_ids.clone())
            .collect()
    };
    assert_eq!(members(&first), members(&second));
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    let db = seeded(5, 1);
    let memories = db.store.memories_for_user(USER, None).unwrap();

    let first = db.service.extractor().extract_all(&memories).await;
    for memory in &memories {
        db.service.invalidate(&memory.id);
    }
    let second = db.service.extractor().extract_all(&memories).await;

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.embedding, b.embedding);
        assert_eq!(a.keywords, b.keywords);
        assert_eq!(a.entities, b.entities);
    }
}

#[tokio::test]
async fn test_single_memory_yields_nothing() {
    let db = TestDatabaseManager::new_temp();
    db.register(USER);
    TestDataFactory::create_memory(&db.store, USER, "Went hiking with Sam");

    let view = db
        .service
        .graph(
            USER,
            &GraphQuery::default().min_strength(0.0).with_clusters(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(view.graph.nodes.len(), 1);
    assert!(view.graph.edges.is_empty());
    assert_eq!(view.clusters.map(|c| c.len()), Some(0));

    let clusters = db
        .service
        .detect_clusters(USER, TimeRange::All, None, &CancellationToken::new())
        .await
        .unwrap();
    assert!(clusters.is_empty());
}

#[tokio::test]
async fn test_every_clustered_memory_is_in_the_graph_once() {
    let db = seeded(30, 1);
    let view = db
        .service
        .graph(USER, &GraphQuery::default().with_clusters(), &CancellationToken::new())
        .await
        .unwrap();

    let node_ids: BTreeSet<&str> = view.graph.nodes.iter().map(|m| m.id.as_str()).collect();
    let mut seen = BTreeSet::new();
    for cluster in view.clusters.iter().flatten() {
        assert!(cluster.len() >= 2);
        for id in &cluster.member_ids {
            assert!(node_ids.contains(id.as_str()));
            assert!(seen.insert(id.clone()), "{} in two clusters", id);
        }
    }
}

#[tokio::test]
async fn test_cancelled_query_returns_no_partial_graph() {
    let db = seeded(10, 1);
    let token = CancellationToken::new();
    token.cancel();

    let err = db
        .service
        .graph(USER, &GraphQuery::default(), &token)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "cancelled");
}
