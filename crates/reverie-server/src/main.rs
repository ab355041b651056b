//! Reverie Server - HTTP API for the memory relationship engine
//!
//! Serves relationship graphs, clusters, manual relationships and memory
//! paths for the journal entries stored in a local SQLite database.
//!
//! Endpoints:
//! - `GET  /api/health`
//! - `POST /api/users`
//! - `GET|POST /api/users/{user_id}/memories`
//! - `GET  /api/users/{user_id}/graph`
//! - `POST /api/users/{user_id}/clusters/detect`
//! - `GET  /api/users/{user_id}/clusters`
//! - `POST /api/users/{user_id}/memories/{id}/relate/{target_id}`
//! - `GET  /api/users/{user_id}/memories/{id}/path/{target_id}`

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use reverie_server::api::{self, state::AppState};
use reverie_server::engine::{self, EmbedderKind};

/// Reverie HTTP API server
#[derive(Parser)]
#[command(name = "reverie-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP API for the Reverie memory relationship engine")]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG                  Log level filter (e.g., debug, info, warn, error)\n    REVERIE_MIN_STRENGTH      Default minimum relationship strength\n    REVERIE_CLUSTER_KEYWORDS  Keywords kept per cluster")]
struct Args {
    /// Custom data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Port to bind the API to
    #[arg(long, env = "REVERIE_PORT", default_value_t = api::DEFAULT_PORT)]
    port: u16,

    /// Embedding model: hashing or local
    #[arg(long, default_value = "hashing")]
    embedder: EmbedderKind,
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments first (before logging init, so --help/--version work cleanly)
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    info!("Reverie Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let engine = match engine::open(args.data_dir, args.embedder).await {
        Ok(e) => {
            info!(
                model = e.service.extractor().model_name(),
                "Engine initialized successfully"
            );
            e
        }
        Err(e) => {
            error!("Failed to initialize engine: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(engine.store, engine.service);
    if let Err(e) = api::serve(state, args.port).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Reverie Server shutting down");
}
