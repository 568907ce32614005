//! SQLite Item Store
//!
//! Persistence for memorization items plus the orchestration glue that
//! routes rating events through the engine and commits the outcome. The
//! engine itself never touches the store: every scheduling decision is a
//! pure function of an item snapshot, and this layer applies it.
//!
//! Every read-modify-write (rating, range edit, reset sweep) reads its
//! snapshot and commits the result while holding the writer connection's
//! lock, so two near-simultaneous partial ratings for the same item
//! cannot race to a lost update.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use chrono_tz::Tz;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::clock::Clock;
use crate::item::{
    CreateItemInput, ItemStats, MemorizationItem, RangeError, VerseRange,
};
use crate::srs::{
    self, apply_item_rating, apply_unit_rating, Rating, RatingOutcome, RoundError,
};

/// Settings key for the user's timezone override
const TIMEZONE_SETTING: &str = "timezone";

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
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Range validation failure
    #[error(transparent)]
    Range(#[from] RangeError),
    /// Rating-round failure
    #[error(transparent)]
    Round(#[from] RoundError),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed item store.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self` (not `&mut self`), making `Storage` `Send + Sync`
/// so callers can share it behind an `Arc`.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    clock: Mutex<Clock>,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create new storage instance
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("app", "hifz", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("hifz.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        let storage = Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            clock: Mutex::new(Clock::new()),
        };

        // Restore a persisted timezone override, if any
        if let Some(zone) = storage.get_setting(TIMEZONE_SETTING)? {
            let mut clock = storage.lock_clock()?;
            clock.set_zone_override(Some(&zone));
        }

        Ok(storage)
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn lock_reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    fn lock_clock(&self) -> Result<std::sync::MutexGuard<'_, Clock>> {
        self.clock
            .lock()
            .map_err(|_| StorageError::Init("Clock lock poisoned".into()))
    }

    // ========================================================================
    // CLOCK / SETTINGS
    // ========================================================================

    /// The resolved user zone (override > host > UTC)
    pub fn resolve_zone(&self) -> Result<Tz> {
        Ok(self.lock_clock()?.resolve_user_zone(None))
    }

    /// Today's civil date in the resolved zone
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(self.lock_clock()?.today())
    }

    /// Persist (or clear) the user's timezone override
    pub fn set_timezone(&self, zone: Option<&str>) -> Result<()> {
        match zone {
            Some(name) => self.set_setting(TIMEZONE_SETTING, name)?,
            None => self.delete_setting(TIMEZONE_SETTING)?,
        }
        self.lock_clock()?.set_zone_override(zone);
        Ok(())
    }

    /// Read a settings value
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let reader = self.lock_reader()?;
        let value = reader
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write a settings value
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let writer = self.lock_writer()?;
        writer.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete_setting(&self, key: &str) -> Result<()> {
        let writer = self.lock_writer()?;
        writer.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ========================================================================
    // STORE PRIMITIVES
    // ========================================================================

    /// Load the whole item collection
    pub fn load_all(&self) -> Result<Vec<MemorizationItem>> {
        let reader = self.lock_reader()?;
        Self::load_all_in(&reader)
    }

    /// Fetch a single item by id
    pub fn get(&self, id: &str) -> Result<Option<MemorizationItem>> {
        let reader = self.lock_reader()?;
        Self::get_in(&reader, id)
    }

    fn load_all_in(conn: &Connection) -> Result<Vec<MemorizationItem>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM memorization_items ORDER BY surah, ayah_start, ayah_end",
        )?;

        let rows = stmt.query_map([], |row| Self::row_to_item(row))?;
        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    fn get_in(conn: &Connection, id: &str) -> Result<Option<MemorizationItem>> {
        let mut stmt = conn.prepare("SELECT * FROM memorization_items WHERE id = ?1")?;
        let item = stmt
            .query_row(params![id], |row| Self::row_to_item(row))
            .optional()?;
        Ok(item)
    }

    /// Insert or replace a single item
    pub fn upsert(&self, item: &MemorizationItem) -> Result<()> {
        let writer = self.lock_writer()?;
        Self::upsert_in(&writer, item)
    }

    /// Insert or replace a batch of items in one transaction
    pub fn upsert_many(&self, items: &[MemorizationItem]) -> Result<()> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;
        for item in items {
            Self::upsert_in(&tx, item)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove an item by id; returns whether a row was deleted
    pub fn remove(&self, id: &str) -> Result<bool> {
        let writer = self.lock_writer()?;
        let deleted = writer.execute("DELETE FROM memorization_items WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn upsert_in(conn: &Connection, item: &MemorizationItem) -> Result<()> {
        let ratings_json = serde_json::to_string(&item.individual_ratings)
            .map_err(|e| StorageError::Init(format!("Serialize ratings: {}", e)))?;
        let tags_json = serde_json::to_string(&item.tags)
            .map_err(|e| StorageError::Init(format!("Serialize tags: {}", e)))?;
        let ruku_json = serde_json::to_string(&item.ruku_markers)
            .map_err(|e| StorageError::Init(format!("Serialize ruku markers: {}", e)))?;

        conn.execute(
            "INSERT INTO memorization_items (
                id, surah, ayah_start, ayah_end,
                interval, next_review, ease_factor, review_count,
                last_reviewed, completed_today,
                created_at, memorization_age,
                individual_ratings, name, description, tags, ruku_markers
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(id) DO UPDATE SET
                surah = excluded.surah,
                ayah_start = excluded.ayah_start,
                ayah_end = excluded.ayah_end,
                interval = excluded.interval,
                next_review = excluded.next_review,
                ease_factor = excluded.ease_factor,
                review_count = excluded.review_count,
                last_reviewed = excluded.last_reviewed,
                completed_today = excluded.completed_today,
                created_at = excluded.created_at,
                memorization_age = excluded.memorization_age,
                individual_ratings = excluded.individual_ratings,
                name = excluded.name,
                description = excluded.description,
                tags = excluded.tags,
                ruku_markers = excluded.ruku_markers",
            params![
                item.id,
                item.range.surah,
                item.range.ayah_start,
                item.range.ayah_end,
                item.interval,
                item.next_review,
                item.ease_factor,
                item.review_count,
                item.last_reviewed,
                item.completed_today,
                item.created_at,
                item.memorization_age,
                ratings_json,
                item.name,
                item.description,
                tags_json,
                ruku_json,
            ],
        )?;
        Ok(())
    }

    /// Convert a row to MemorizationItem
    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<MemorizationItem> {
        let ratings_json: String = row.get("individual_ratings")?;
        let individual_ratings: BTreeMap<u32, Rating> = serde_json::from_str(&ratings_json)
            .unwrap_or_else(|e| {
                tracing::warn!("Unparseable rating round, dropping: {}", e);
                BTreeMap::new()
            });

        let tags_json: String = row.get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();

        let ruku_json: Option<String> = row.get("ruku_markers").ok();
        let ruku_markers: Vec<u32> = ruku_json
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();

        let next_review: NaiveDate = row.get("next_review")?;
        let created_at: NaiveDate = row.get("created_at")?;
        let last_reviewed: Option<NaiveDate> = row.get("last_reviewed")?;
        let completed_today: Option<NaiveDate> = row.get("completed_today")?;

        Ok(MemorizationItem {
            id: row.get("id")?,
            range: VerseRange {
                surah: row.get("surah")?,
                ayah_start: row.get("ayah_start")?,
                ayah_end: row.get("ayah_end")?,
            },
            interval: row.get("interval")?,
            next_review,
            ease_factor: row.get("ease_factor")?,
            review_count: row.get("review_count")?,
            last_reviewed,
            completed_today,
            created_at,
            memorization_age: row.get("memorization_age")?,
            individual_ratings,
            name: row.get("name")?,
            description: row.get("description")?,
            tags,
            ruku_markers,
        })
    }

    // ========================================================================
    // ORCHESTRATION
    // ========================================================================

    /// Create an item, or return the stored one if an identical range
    /// already exists (upsert-on-create keyed by the derived id).
    pub fn create_item(
        &self,
        input: CreateItemInput,
        today: NaiveDate,
    ) -> Result<MemorizationItem> {
        let item = MemorizationItem::create(input, today)?;

        let writer = self.lock_writer()?;
        if let Some(existing) = Self::get_in(&writer, &item.id)? {
            tracing::debug!("Range {} already stored, returning existing", existing.range);
            return Ok(existing);
        }

        Self::upsert_in(&writer, &item)?;
        Ok(item)
    }

    /// Rate a whole item in one event
    pub fn rate_item(&self, id: &str, rating: Rating, today: NaiveDate) -> Result<MemorizationItem> {
        let writer = self.lock_writer()?;
        let item = Self::get_in(&writer, id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let updated = apply_item_rating(&item, rating, today);
        Self::upsert_in(&writer, &updated)?;
        Ok(updated)
    }

    /// Rate a single ayah of an item and commit the outcome.
    ///
    /// Partial and uniform outcomes update the item in place. A split
    /// atomically replaces the original with its fragments: the original
    /// id is deleted and all fragments inserted in one transaction.
    ///
    /// The snapshot is read and the outcome committed under one hold of
    /// the writer lock, so interleaved partial ratings for the same item
    /// cannot overwrite each other.
    pub fn rate_verse(
        &self,
        id: &str,
        ayah: u32,
        rating: Rating,
        today: NaiveDate,
    ) -> Result<RatingOutcome> {
        let mut writer = self.lock_writer()?;
        let item = Self::get_in(&writer, id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let outcome = apply_unit_rating(&item, ayah, rating, today)?;

        match &outcome {
            RatingOutcome::Partial(updated) | RatingOutcome::Uniform(updated) => {
                Self::upsert_in(&writer, updated)?;
            }
            RatingOutcome::Split(fragments) => {
                let tx = writer.transaction()?;
                tx.execute("DELETE FROM memorization_items WHERE id = ?1", params![id])?;
                for fragment in fragments {
                    Self::upsert_in(&tx, fragment)?;
                }
                tx.commit()?;
                tracing::info!(
                    "Item {} split into {} fragments",
                    item.range,
                    fragments.len()
                );
            }
        }

        Ok(outcome)
    }

    /// Change an item's range. Identity is derived from the range, so this
    /// mints a new id and atomically replaces the old row.
    pub fn update_range(&self, id: &str, new_range: VerseRange) -> Result<MemorizationItem> {
        new_range.validate()?;

        let mut writer = self.lock_writer()?;
        let mut item = Self::get_in(&writer, id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        item.range = new_range;
        item.id = new_range.item_id();
        // A range edit invalidates any in-progress round: its keys may no
        // longer be a subset of the range.
        item.individual_ratings.clear();

        let tx = writer.transaction()?;
        tx.execute("DELETE FROM memorization_items WHERE id = ?1", params![id])?;
        Self::upsert_in(&tx, &item)?;
        tx.commit()?;

        Ok(item)
    }

    /// Items due on or before `today`
    pub fn due(&self, today: NaiveDate) -> Result<Vec<MemorizationItem>> {
        let items = self.load_all()?;
        Ok(srs::due_items(&items, today).into_iter().cloned().collect())
    }

    /// Items scheduled within the next `days` days
    pub fn upcoming(&self, today: NaiveDate, days: u64) -> Result<Vec<MemorizationItem>> {
        let items = self.load_all()?;
        Ok(srs::upcoming_items(&items, today, days)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Clear stale same-day completion markers and persist the changes.
    /// Returns the number of items cleared. Run once per session before
    /// deriving the due/upcoming views.
    pub fn reset_daily_completions(&self, today: NaiveDate) -> Result<usize> {
        let mut writer = self.lock_writer()?;
        let mut items = Self::load_all_in(&writer)?;
        let cleared = srs::reset_daily_completions(&mut items, today);
        if cleared.is_empty() {
            return Ok(0);
        }

        let tx = writer.transaction()?;
        for id in &cleared {
            tx.execute(
                "UPDATE memorization_items SET completed_today = NULL WHERE id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;
        Ok(cleared.len())
    }

    /// Collection statistics as of `today`
    pub fn stats(&self, today: NaiveDate) -> Result<ItemStats> {
        let items = self.load_all()?;

        let total_items = items.len() as i64;
        let items_due = items.iter().filter(|i| i.is_due(today)).count() as i64;
        let reviewed_today = items
            .iter()
            .filter(|i| i.completed_today == Some(today))
            .count() as i64;
        let average_ease_factor = if items.is_empty() {
            0.0
        } else {
            items.iter().map(|i| i.ease_factor).sum::<f64>() / items.len() as f64
        };

        Ok(ItemStats {
            total_items,
            items_due,
            reviewed_today,
            average_ease_factor,
            oldest_item: items.iter().map(|i| i.created_at).min(),
            newest_item: items.iter().map(|i| i.created_at).max(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
