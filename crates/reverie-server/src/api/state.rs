//! API shared state

use std::sync::Arc;

use reverie_core::{GraphService, SqliteStore};

/// Shared application state for the HTTP API
#[derive(Clone)]
pub struct AppState {
    /// Concrete store, for user and memory administration
    pub store: Arc<SqliteStore>,
    /// Relationship engine over the same store
    pub service: Arc<GraphService>,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, service: Arc<GraphService>) -> Self {
        Self { store, service }
    }
}
