//! Local Semantic Embeddings
//!
//! Uses fastembed v5.11 for local ONNX inference with all-MiniLM-L6-v2
//! (384 dimensions). The model is loaded once per process and shared.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::embedder::{normalize, EmbeddingError, TextEmbedder, DEFAULT_DIMENSIONS};

/// Maximum text length in bytes passed to the model (truncated if longer)
pub const MAX_TEXT_LENGTH: usize = 2048;

static MODEL: OnceLock<Result<Mutex<TextEmbedding>, String>> = OnceLock::new();

/// Model cache directory
///
/// Uses FASTEMBED_CACHE_PATH when set, otherwise the platform cache directory.
fn cache_dir() -> PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = directories::ProjectDirs::from("com", "reverie", "core") {
        return dirs.cache_dir().join("fastembed");
    }
    PathBuf::from(".fastembed_cache")
}

fn model() -> Result<MutexGuard<'static, TextEmbedding>, EmbeddingError> {
    let result = MODEL.get_or_init(|| {
        let dir = cache_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create cache directory {:?}: {}", dir, e);
        }

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false)
            .with_cache_dir(dir);

        TextEmbedding::try_new(options)
            .map(Mutex::new)
            .map_err(|e| format!("Failed to initialize all-MiniLM-L6-v2: {}", e))
    });

    match result {
        Ok(m) => m
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("Lock poisoned: {}", e))),
        Err(err) => Err(EmbeddingError::ModelInit(err.clone())),
    }
}

/// Cut `text` to at most `max` bytes on a char boundary
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// fastembed-backed [`TextEmbedder`]
#[derive(Debug, Clone, Default)]
pub struct LocalEmbedder;

impl LocalEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Load the model now instead of on first use (downloads if necessary)
    pub fn init(&self) -> Result<(), EmbeddingError> {
        model().map(|_| ())
    }

    fn embed_blocking(text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let mut model = model()?;
        let mut embeddings = model
            .embed(vec![truncate(text, MAX_TEXT_LENGTH)], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        let mut vector = embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding generated".into()))?;
        normalize(&mut vector);
        Ok(vector)
    }
}

#[async_trait]
impl TextEmbedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        "sentence-transformers/all-MiniLM-L6-v2"
    }

    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || Self::embed_blocking(&text))
            .await
            .map_err(|e| EmbeddingError::EmbeddingFailed(format!("Embedding task failed: {}", e)))?
    }
}
