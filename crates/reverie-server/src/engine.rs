//! Engine setup shared by the server and CLI binaries

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use reverie_core::{EngineConfig, GraphService, HeuristicAnalyzer, SqliteStore, TextEmbedder};

/// Which embedding capability to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedderKind {
    /// Deterministic feature hashing, no model download
    #[default]
    Hashing,
    /// Local ONNX inference (requires the `embeddings` feature)
    Local,
}

impl FromStr for EmbedderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" => Ok(EmbedderKind::Hashing),
            "local" => Ok(EmbedderKind::Local),
            other => Err(format!("unknown embedder '{}' (expected hashing or local)", other)),
        }
    }
}

/// Store and query service over one database
pub struct Engine {
    pub store: Arc<SqliteStore>,
    pub service: Arc<GraphService>,
}

/// Open the database under `data_dir` (platform default when `None`) and wire
/// the query service with the requested embedder
pub async fn open(data_dir: Option<PathBuf>, embedder: EmbedderKind) -> anyhow::Result<Engine> {
    let db_path = data_dir.map(|dir| dir.join("reverie.db"));
    let store = Arc::new(SqliteStore::new(db_path)?);
    tracing::info!("Storage opened at {}", store.path().display());

    let mut config = EngineConfig::from_env();
    let embedder = build_embedder(embedder, &mut config).await?;

    let service = GraphService::new(
        store.clone(),
        embedder,
        Arc::new(HeuristicAnalyzer::new()),
        config,
    );

    Ok(Engine {
        store,
        service: Arc::new(service),
    })
}

async fn build_embedder(
    kind: EmbedderKind,
    config: &mut EngineConfig,
) -> anyhow::Result<Arc<dyn TextEmbedder>> {
    match kind {
        EmbedderKind::Hashing => Ok(Arc::new(reverie_core::HashingEmbedder::new(
            config.embedding_dimensions,
        ))),
        #[cfg(feature = "embeddings")]
        EmbedderKind::Local => {
            let embedder = reverie_core::LocalEmbedder::new();
            // First use may download the model
            let loader = embedder.clone();
            match tokio::task::spawn_blocking(move || loader.init()).await {
                Ok(Ok(())) => tracing::info!("Embedding model ready"),
                Ok(Err(e)) => {
                    tracing::error!("Failed to initialize embedding model: {}", e);
                    tracing::error!("Hint: Check FASTEMBED_CACHE_PATH or network access for the first download");
                }
                Err(e) => tracing::error!("Embedding model loader failed: {}", e),
            }
            config.embedding_dimensions = embedder.dimensions();
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "embeddings"))]
        EmbedderKind::Local => {
            anyhow::bail!("the local embedder requires building with --features embeddings")
        }
    }
}
