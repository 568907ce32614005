//! Database Migrations
//!
//! Schema migration definitions for the item store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: memorization items and settings",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Add ruku markers for display metadata",
        up: MIGRATION_V2_UP,
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
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS memorization_items (
    id TEXT PRIMARY KEY,
    surah INTEGER NOT NULL,
    ayah_start INTEGER NOT NULL,
    ayah_end INTEGER NOT NULL,

    -- Scheduling state
    interval INTEGER NOT NULL DEFAULT 1,
    next_review TEXT NOT NULL,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    review_count INTEGER NOT NULL DEFAULT 0,
    last_reviewed TEXT,
    completed_today TEXT,

    -- Age
    created_at TEXT NOT NULL,
    memorization_age INTEGER,

    -- In-progress rating round (ayah -> rating), JSON object
    individual_ratings TEXT NOT NULL DEFAULT '{}',

    -- Descriptive metadata, opaque to the scheduler
    name TEXT,
    description TEXT,
    tags TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_items_next_review ON memorization_items(next_review);
CREATE INDEX IF NOT EXISTS idx_items_surah ON memorization_items(surah, ayah_start);
CREATE INDEX IF NOT EXISTS idx_items_completed ON memorization_items(completed_today);

-- User settings (timezone override, display preferences)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// V2: Ruku markers
const MIGRATION_V2_UP: &str = r#"
ALTER TABLE memorization_items ADD COLUMN ruku_markers TEXT NOT NULL DEFAULT '[]';
"#;

/// Get the current schema version
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            conn.execute_batch(migration.up)?;
            conn.execute(
                "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
                [migration.version],
            )?;

            applied += 1;
        }
    }

    Ok(applied)
}
