//! Storage Module
//!
//! The engine reads memories and persists manual relationships and clusters
//! through [`MemoryStore`]. [`SqliteStore`] is the shipped implementation:
//! - Separate reader/writer connections, WAL mode
//! - Versioned schema migrations
//! - JSON columns for tags, keywords and cluster members

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, SqliteStore, StorageError, UserRecord};

use chrono::{DateTime, Utc};

use crate::clusters::Cluster;
use crate::memory::Memory;
use crate::relationships::Relationship;

/// Storage collaborator of the relationship engine
///
/// Implementations must be shareable across threads; the query service holds
/// one behind an `Arc`.
pub trait MemoryStore: Send + Sync {
    /// Whether the user is registered
    fn user_exists(&self, user_id: &str) -> Result<bool>;

    /// A user's memories created at or after `since` (all when `None`),
    /// oldest first
    fn memories_for_user(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Memory>>;

    /// Look up one memory
    fn get_memory(&self, memory_id: &str) -> Result<Option<Memory>>;

    /// Insert or replace the manual relationship on this unordered pair
    fn save_manual_relationship(&self, relationship: &Relationship) -> Result<()>;

    /// All of a user's manual relationships, oldest first
    fn manual_relationships(&self, user_id: &str) -> Result<Vec<Relationship>>;

    /// Replace a user's persisted clusters
    fn replace_clusters(&self, user_id: &str, clusters: &[Cluster]) -> Result<()>;

    /// A user's persisted clusters in their stored order
    fn clusters(&self, user_id: &str) -> Result<Vec<Cluster>>;
}
