//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - A query service wired to the same store
//! - Registered users ready for seeding

use std::path::PathBuf;
use std::sync::Arc;

use reverie_core::{EngineConfig, GraphService, MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Manager for test databases
///
/// Creates an isolated database and query service for each test. The
/// database is deleted when the manager is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// db.register("ada");
/// TestDataFactory::create_memory(&db.store, "ada", "Went hiking with Sam");
/// let view = db.service.graph("ada", &GraphQuery::default(), &token).await?;
/// ```
pub struct TestDatabaseManager {
    /// The store instance
    pub store: Arc<SqliteStore>,
    /// Query service over `store`
    pub service: Arc<GraphService>,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: TempDir,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Temporary database with the default engine configuration
    pub fn new_temp() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Temporary database with a custom engine configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_reverie.db");

        let store =
            Arc::new(SqliteStore::new(Some(db_path.clone())).expect("Failed to create test store"));
        let service = Arc::new(GraphService::with_defaults(store.clone(), config));

        Self {
            store,
            service,
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Register a user, returning its id
    pub fn register(&self, user_id: &str) -> String {
        self.store
            .create_user(user_id, None)
            .expect("Failed to register user")
            .id
    }

    /// Number of memories a user has
    pub fn memory_count(&self, user_id: &str) -> usize {
        self.store.count_memories(user_id).unwrap_or(0)
    }

    /// Whether the user has no memories
    pub fn is_empty(&self, user_id: &str) -> bool {
        self.store
            .memories_for_user(user_id, None)
            .map(|m| m.is_empty())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_temp_creates_file() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.path().exists());
    }

    #[test]
    fn test_register_and_count() {
        let db = TestDatabaseManager::new_temp();
        let user = db.register("ada");
        assert_eq!(user, "ada");
        assert!(db.is_empty("ada"));
        assert_eq!(db.memory_count("ada"), 0);
    }
}
