//! API endpoint handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use reverie_core::{
    parse_time_range, GraphQuery, GraphView, ManualRelationInput, Memory, MemoryStore, NewMemory,
    ServiceError, TimeRange, UserRecord,
};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::error::ApiError;
use super::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Strength of a manual relationship when the caller gives none
const DEFAULT_MANUAL_STRENGTH: f64 = 0.8;

/// Token cancelled when the returned guard drops, i.e. when the handler
/// future finishes or is dropped by a disconnecting client
fn request_token() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

fn time_range_or_all(raw: Option<&str>) -> ApiResult<TimeRange> {
    match raw {
        Some(s) => Ok(parse_time_range(s)?),
        None => Ok(TimeRange::All),
    }
}

fn ensure_user(state: &AppState, user_id: &str) -> ApiResult<()> {
    if state.store.user_exists(user_id)? {
        Ok(())
    } else {
        Err(ServiceError::UnknownUser(user_id.to_string()).into())
    }
}

// ============================================================================
// HEALTH
// ============================================================================

/// Liveness and version
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "engineVersion": reverie_core::VERSION,
        "embeddingModel": state.service.extractor().model_name(),
    }))
}

// ============================================================================
// USERS & MEMORIES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Register a user (idempotent)
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    let Json(body) = body?;
    if body.id.trim().is_empty() {
        return Err(ApiError::bad_request("invalid_user_id", "User id cannot be empty"));
    }
    let user = state.store.create_user(&body.id, body.display_name.as_deref())?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryListParams {
    pub time_range: Option<String>,
}

/// List a user's memories, oldest first
pub async fn list_memories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    params: Result<Query<MemoryListParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let range = time_range_or_all(params.time_range.as_deref())?;
    ensure_user(&state, &user_id)?;

    let memories = state.store.memories_for_user(&user_id, range.since(Utc::now()))?;
    Ok(Json(serde_json::json!({
        "total": memories.len(),
        "memories": memories,
    })))
}

/// Write a memory for a user
pub async fn add_memory(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<NewMemory>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Memory>)> {
    let Json(mut body) = body?;
    ensure_user(&state, &user_id)?;
    body.user_id = user_id;

    let memory = state.store.insert_memory(body)?;
    tracing::debug!(memory_id = %memory.id, "Memory added");
    Ok((StatusCode::CREATED, Json(memory)))
}

// ============================================================================
// GRAPH & CLUSTERS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphParams {
    pub time_range: Option<String>,
    pub min_strength: Option<f64>,
    #[serde(default)]
    pub include_clusters: bool,
}

/// Relationship graph of a user's memories
pub async fn get_graph(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    params: Result<Query<GraphParams>, QueryRejection>,
) -> ApiResult<Json<GraphView>> {
    let Query(params) = params?;
    let query = GraphQuery {
        time_range: time_range_or_all(params.time_range.as_deref())?,
        min_strength: params.min_strength,
        include_clusters: params.include_clusters,
    };

    let (cancel, _guard) = request_token();
    let view = state.service.graph(&user_id, &query, &cancel).await?;
    Ok(Json(view))
}

/// Detect and persist clusters
pub async fn detect_clusters(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    params: Result<Query<GraphParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let range = time_range_or_all(params.time_range.as_deref())?;

    let (cancel, _guard) = request_token();
    let clusters = state
        .service
        .detect_clusters(&user_id, range, params.min_strength, &cancel)
        .await?;

    Ok(Json(serde_json::json!({
        "count": clusters.len(),
        "clusters": clusters,
    })))
}

/// Last persisted clusters
pub async fn list_clusters(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let clusters = state.service.stored_clusters(&user_id)?;
    Ok(Json(serde_json::json!({ "clusters": clusters })))
}

// ============================================================================
// MANUAL RELATIONSHIPS & PATHS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RelateParams {
    pub strength: Option<f64>,
}

/// Persist a manual relationship between two memories
pub async fn relate_memories(
    State(state): State<AppState>,
    Path((user_id, memory_id, target_id)): Path<(String, String, String)>,
    params: Result<Query<RelateParams>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Query(params) = params?;
    let input = ManualRelationInput {
        source_id: memory_id,
        target_id,
        strength: params.strength.unwrap_or(DEFAULT_MANUAL_STRENGTH),
    };
    let relationship = state.service.relate(&user_id, input)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "relationship": relationship })),
    ))
}

/// Cheapest path between two memories
pub async fn find_path(
    State(state): State<AppState>,
    Path((user_id, memory_id, target_id)): Path<(String, String, String)>,
) -> ApiResult<Json<Value>> {
    let (cancel, _guard) = request_token();
    let path = state
        .service
        .path(&user_id, &memory_id, &target_id, &cancel)
        .await?;

    let body = match path {
        Some(p) => serde_json::json!({
            "found": true,
            "path": p.memory_ids,
            "totalCost": p.total_cost,
            "hops": p.hops,
        }),
        None => serde_json::json!({
            "found": false,
            "path": [],
            "totalCost": null,
            "hops": null,
        }),
    };
    Ok(Json(body))
}

// ============================================================================
// TESTS
// ============================================================================
