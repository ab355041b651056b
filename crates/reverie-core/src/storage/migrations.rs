//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: users and memories",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Manual relationships",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Persisted clusters",
        up: MIGRATION_V3_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    display_name TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    mood TEXT,
    tags TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_memories_user_created ON memories(user_id, created_at);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Manual relationships, one per unordered pair
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS manual_relationships (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    source_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    pair_key TEXT NOT NULL,
    strength REAL NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, pair_key)
);

CREATE INDEX IF NOT EXISTS idx_manual_user ON manual_relationships(user_id);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// V3: Persisted clusters
const MIGRATION_V3_UP: &str = r#"
CREATE TABLE IF NOT EXISTS clusters (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    theme TEXT NOT NULL,
    category TEXT NOT NULL,
    member_ids TEXT NOT NULL DEFAULT '[]',
    keywords TEXT NOT NULL DEFAULT '[]',
    summary TEXT NOT NULL,
    dominant_mood TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clusters_user ON clusters(user_id, position);

UPDATE schema_version SET version = 3, applied_at = datetime('now');
"#;

/// Schema version recorded in the database, 0 for a fresh file
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Bring the schema up to date, returning how many migrations ran
///
/// Runs every time a store is opened, so an up-to-date database is a no-op.
/// Each migration commits together with its version bump.
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        tracing::debug!(version = current_version, "Schema up to date");
        return Ok(0);
    }

    for migration in &pending {
        tracing::info!(
            version = migration.version,
            "Applying migration: {}",
            migration.description
        );
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.up)?;
        tx.commit()?;
    }

    Ok(pending.len() as u32)
}
