//! SQLite Storage Implementation

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::MemoryStore;
use crate::clusters::{Cluster, ClusterCategory};
use crate::memory::{Memory, Mood, NewMemory};
use crate::relationships::{pair_key, Relationship};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed [`MemoryStore`]
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self`, so the store is shared as `Arc<SqliteStore>`.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "reverie", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join("reverie.db"))
    }

    /// Open (or create) a store; `None` uses [`default_path`](Self::default_path)
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!("Applied {} migration(s) to {:?}", applied, path);
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Database file location
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // USERS
    // ========================================================================

    /// Register a user; registering an existing id returns the stored record
    pub fn create_user(&self, user_id: &str, display_name: Option<&str>) -> Result<UserRecord> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(StorageError::Init("User id cannot be empty".into()));
        }
        {
            let writer = self.writer()?;
            writer.execute(
                "INSERT OR IGNORE INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, display_name, format_timestamp(Utc::now())],
            )?;
        }
        self.get_user(user_id)?
            .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))
    }

    /// Look up a user
    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let reader = self.reader()?;
        let user = reader
            .query_row(
                "SELECT id, display_name, created_at FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    let created_at: String = row.get(2)?;
                    Ok(UserRecord {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        created_at: parse_timestamp(&created_at, "created_at")?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    // ========================================================================
    // MEMORIES
    // ========================================================================

    /// Write a new memory for a registered user
    pub fn insert_memory(&self, input: NewMemory) -> Result<Memory> {
        if !self.user_exists(&input.user_id)? {
            return Err(StorageError::NotFound(format!("user {}", input.user_id)));
        }

        let memory = Memory {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: input.user_id,
            text: input.text,
            created_at: input.created_at.unwrap_or_else(Utc::now),
            mood: input.mood,
            tags: input.tags,
        };

        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO memories (id, user_id, text, created_at, mood, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                memory.id,
                memory.user_id,
                memory.text,
                format_timestamp(memory.created_at),
                memory.mood.map(|m| m.as_str()),
                serde_json::to_string(&memory.tags)?,
            ],
        )?;

        Ok(memory)
    }

    /// Delete a memory; its manual relationships go with it
    pub fn delete_memory(&self, memory_id: &str) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute("DELETE FROM memories WHERE id = ?1", params![memory_id])?;
        Ok(rows > 0)
    }

    /// Number of memories a user has
    pub fn count_memories(&self, user_id: &str) -> Result<usize> {
        let reader = self.reader()?;
        let count: i64 = reader.query_row(
            "SELECT COUNT(*) FROM memories WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    fn row_to_memory(row: &rusqlite::Row) -> rusqlite::Result<Memory> {
        let created_at: String = row.get("created_at")?;
        let mood: Option<String> = row.get("mood")?;
        let tags: String = row.get("tags")?;

        Ok(Memory {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            text: row.get("text")?,
            created_at: parse_timestamp(&created_at, "created_at")?,
            mood: mood
                .map(|m| m.parse::<Mood>().map_err(|e| invalid_column("mood", e)))
                .transpose()?,
            tags: json_column(&tags, "tags")?,
        })
    }

    fn row_to_cluster(row: &rusqlite::Row) -> rusqlite::Result<Cluster> {
        let category: String = row.get("category")?;
        let member_ids: String = row.get("member_ids")?;
        let keywords: String = row.get("keywords")?;
        let dominant_mood: Option<String> = row.get("dominant_mood")?;
        let created_at: String = row.get("created_at")?;

        Ok(Cluster {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            theme: row.get("theme")?,
            category: category
                .parse::<ClusterCategory>()
                .map_err(|e| invalid_column("category", e))?,
            member_ids: json_column(&member_ids, "member_ids")?,
            keywords: json_column(&keywords, "keywords")?,
            summary: row.get("summary")?,
            dominant_mood: dominant_mood
                .map(|m| m.parse::<Mood>().map_err(|e| invalid_column("dominant_mood", e)))
                .transpose()?,
            created_at: parse_timestamp(&created_at, "created_at")?,
        })
    }
}

impl MemoryStore for SqliteStore {
    fn user_exists(&self, user_id: &str) -> Result<bool> {
        let reader = self.reader()?;
        let exists: bool = reader.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn memories_for_user(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Memory>> {
        let reader = self.reader()?;
        let since = since.map(format_timestamp);
        let mut stmt = reader.prepare(
            "SELECT * FROM memories
             WHERE user_id = ?1 AND (?2 IS NULL OR created_at >= ?2)
             ORDER BY created_at ASC, id ASC",
        )?;
        let memories = stmt
            .query_map(params![user_id, since], Self::row_to_memory)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(memories)
    }

    fn get_memory(&self, memory_id: &str) -> Result<Option<Memory>> {
        let reader = self.reader()?;
        let memory = reader
            .query_row(
                "SELECT * FROM memories WHERE id = ?1",
                params![memory_id],
                Self::row_to_memory,
            )
            .optional()?;
        Ok(memory)
    }

    fn save_manual_relationship(&self, relationship: &Relationship) -> Result<()> {
        let (a, b) = pair_key(&relationship.source_id, &relationship.target_id);
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO manual_relationships
                (id, user_id, source_id, target_id, pair_key, strength, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, pair_key) DO UPDATE SET
                source_id = excluded.source_id,
                target_id = excluded.target_id,
                strength = excluded.strength",
            params![
                uuid::Uuid::new_v4().to_string(),
                relationship.user_id,
                relationship.source_id,
                relationship.target_id,
                format!("{}|{}", a, b),
                relationship.strength,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn manual_relationships(&self, user_id: &str) -> Result<Vec<Relationship>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT user_id, source_id, target_id, strength FROM manual_relationships
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let relationships = stmt
            .query_map(params![user_id], |row| {
                let user: String = row.get(0)?;
                let source: String = row.get(1)?;
                let target: String = row.get(2)?;
                Ok(Relationship::manual(user, source, target, row.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(relationships)
    }

    fn replace_clusters(&self, user_id: &str, clusters: &[Cluster]) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        tx.execute("DELETE FROM clusters WHERE user_id = ?1", params![user_id])?;
        for (position, cluster) in clusters.iter().enumerate() {
            tx.execute(
                "INSERT INTO clusters
                    (id, user_id, position, name, theme, category, member_ids, keywords,
                     summary, dominant_mood, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    cluster.id,
                    user_id,
                    position as i64,
                    cluster.name,
                    cluster.theme,
                    cluster.category.as_str(),
                    serde_json::to_string(&cluster.member_ids)?,
                    serde_json::to_string(&cluster.keywords)?,
                    cluster.summary,
                    cluster.dominant_mood.map(|m| m.as_str()),
                    format_timestamp(cluster.created_at),
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(user_id, clusters = clusters.len(), "Replaced persisted clusters");
        Ok(())
    }

    fn clusters(&self, user_id: &str) -> Result<Vec<Cluster>> {
        let reader = self.reader()?;
        let mut stmt =
            reader.prepare("SELECT * FROM clusters WHERE user_id = ?1 ORDER BY position ASC")?;
        let clusters = stmt
            .query_map(params![user_id], Self::row_to_cluster)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(clusters)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// RFC 3339 with microseconds and `Z`, so stored values sort chronologically
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse RFC3339 timestamp
fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid_column(field_name, format!("Invalid timestamp '{}': {}", value, e)))
}

/// Decode a JSON text column; corrupt values fail the read
fn json_column<T: serde::de::DeserializeOwned>(value: &str, field_name: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value).map_err(|e| invalid_column(field_name, e.to_string()))
}

fn invalid_column(field_name: &str, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {}", field_name, message),
        )),
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(Some(dir.path().join("test.db"))).unwrap();
        (store, dir)
    }

    #[test]
    fn test_create_user_is_idempotent() {
        let (store, _dir) = create_test_store();
        let first = store.create_user("ada", Some("Ada")).unwrap();
        let again = store.create_user("ada", None).unwrap();
        assert_eq!(first, again);
        assert!(store.user_exists("ada").unwrap());
        assert!(!store.user_exists("bob").unwrap());
    }

    #[test]
    fn test_insert_requires_user() {
        let (store, _dir) = create_test_store();
        let result = store.insert_memory(NewMemory::new("ghost", "Boo"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_memory_roundtrip_and_time_filter() {
        let (store, _dir) = create_test_store();
        store.create_user("ada", None).unwrap();
        let now = Utc::now();

        let old = store
            .insert_memory(NewMemory::new("ada", "Old trip").at(now - Duration::days(60)))
            .unwrap();
        let recent = store
            .insert_memory(
                NewMemory::new("ada", "Recent walk")
                    .at(now - Duration::days(2))
                    .with_mood(Mood::Calm)
                    .with_tags(vec!["outdoors".into()]),
            )
            .unwrap();

        let all = store.memories_for_user("ada", None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, old.id);
        assert_eq!(all[1].mood, Some(Mood::Calm));
        assert_eq!(all[1].tags, vec!["outdoors"]);

        let week = store
            .memories_for_user("ada", Some(now - Duration::days(7)))
            .unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week[0].id, recent.id);

        let fetched = store.get_memory(&recent.id).unwrap().unwrap();
        assert_eq!(fetched.text, "Recent walk");
        assert_eq!(
            fetched.created_at.timestamp_micros(),
            recent.created_at.timestamp_micros()
        );
    }

    #[test]
    fn test_manual_relationship_upsert_and_cascade() {
        let (store, _dir) = create_test_store();
        store.create_user("ada", None).unwrap();
        let a = store.insert_memory(NewMemory::new("ada", "A")).unwrap();
        let b = store.insert_memory(NewMemory::new("ada", "B")).unwrap();

        store
            .save_manual_relationship(&Relationship::manual("ada", &a.id, &b.id, 0.5))
            .unwrap();
        store
            .save_manual_relationship(&Relationship::manual("ada", &b.id, &a.id, 0.8))
            .unwrap();

        let rels = store.manual_relationships("ada").unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].strength, 0.8);
        assert!(rels[0].connects(&a.id, &b.id));

        assert!(store.delete_memory(&a.id).unwrap());
        assert!(store.manual_relationships("ada").unwrap().is_empty());
    }

    #[test]
    fn test_replace_clusters() {
        let (store, _dir) = create_test_store();
        store.create_user("ada", None).unwrap();

        let cluster = Cluster {
            id: "c1".into(),
            user_id: "ada".into(),
            name: "Travel Memories #1".into(),
            theme: "trip".into(),
            category: ClusterCategory::Travel,
            member_ids: vec!["m1".into(), "m2".into()],
            keywords: vec!["trip".into(), "lisbon".into()],
            summary: "A collection of 2 memories related to travel, featuring trip, lisbon".into(),
            dominant_mood: Some(Mood::Happy),
            created_at: Utc::now(),
        };
        store.replace_clusters("ada", &[cluster.clone()]).unwrap();
        let stored = store.clusters("ada").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].member_ids, cluster.member_ids);
        assert_eq!(stored[0].category, ClusterCategory::Travel);
        assert_eq!(stored[0].dominant_mood, Some(Mood::Happy));

        store.replace_clusters("ada", &[]).unwrap();
        assert!(store.clusters("ada").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_json_columns_fail_the_read() {
        let (store, _dir) = create_test_store();
        store.create_user("ada", None).unwrap();
        let memory = store.insert_memory(NewMemory::new("ada", "Tagged entry")).unwrap();

        store
            .writer()
            .unwrap()
            .execute(
                "UPDATE memories SET tags = 'not json' WHERE id = ?1",
                params![memory.id],
            )
            .unwrap();
        assert!(store.memories_for_user("ada", None).is_err());
        assert!(store.get_memory(&memory.id).is_err());
    }
}
