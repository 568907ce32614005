//! Storage Module
//!
//! SQLite-based item store with:
//! - Load/upsert/remove primitives keyed by range-derived ids
//! - Orchestration of rating events (including atomic split replacement)
//! - Versioned schema migrations
//! - Persisted user settings (timezone override)

mod migrations;
mod sqlite;

pub use migrations::{apply_migrations, get_current_version, Migration, MIGRATIONS};
pub use sqlite::{Result, Storage, StorageError};
