//! Reverie HTTP API
//!
//! JSON endpoints over the relationship engine, bound to localhost:3929 by
//! default. Every computation is tied to its request: a dropped connection
//! cancels the graph build it started.

pub mod error;
pub mod handlers;
pub mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use state::AppState;

/// Default port for the HTTP API
pub const DEFAULT_PORT: u16 = 3929;

/// Build the axum router with all API routes
pub fn build_router(state: AppState, port: u16) -> Router {
    let origins = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .into_iter()
    .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
    .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        // Users and memories
        .route("/api/users", post(handlers::create_user))
        .route(
            "/api/users/{user_id}/memories",
            get(handlers::list_memories).post(handlers::add_memory),
        )
        // Relationship engine
        .route("/api/users/{user_id}/graph", get(handlers::get_graph))
        .route(
            "/api/users/{user_id}/clusters/detect",
            post(handlers::detect_clusters),
        )
        .route("/api/users/{user_id}/clusters", get(handlers::list_clusters))
        .route(
            "/api/users/{user_id}/memories/{memory_id}/relate/{target_id}",
            post(handlers::relate_memories),
        )
        .route(
            "/api/users/{user_id}/memories/{memory_id}/path/{target_id}",
            get(handlers::find_path),
        )
        .layer(ServiceBuilder::new().concurrency_limit(50).layer(cors))
        .with_state(state)
}

/// Serve the API until the process is stopped
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state, port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Reverie API listening at http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
