//! # Hifz Core
//!
//! Scheduling engine for Quran memorization review. Implements:
//!
//! - **Tiered spaced repetition**: intervals keyed to a passage's
//!   effective memorization age, so fresh material is reviewed daily and
//!   long-held material spaces out to a week
//! - **Per-verse rating rounds**: each ayah of a composite item can be
//!   rated independently; divergent ratings fragment the item into
//!   independently-scheduled sub-ranges
//! - **Civil-date scheduling**: all day arithmetic is calendar-based in
//!   the user's IANA zone, never 24-hour UTC offsets, so DST transitions
//!   cannot shift a review date
//! - **Deterministic identity**: item ids derive from
//!   `(surah, ayah_start, ayah_end)`, so identical ranges collapse on
//!   creation and range edits mint fresh ids
//!
//! The engine is synchronous and side-effect-free: every operation takes
//! an immutable item snapshot plus an explicit `today`, and returns a new
//! snapshot. The SQLite [`Storage`] layer commits those outcomes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hifz_core::{CreateItemInput, Rating, Storage};
//!
//! let storage = Storage::new(None)?;
//! let today = storage.today()?;
//! storage.reset_daily_completions(today)?;
//!
//! // Memorize Al-Mulk 1-5
//! let item = storage.create_item(CreateItemInput::for_range(67, 1, 5), today)?;
//!
//! // Rate each ayah; divergent ratings split the item
//! for ayah in 1..=5 {
//!     storage.rate_verse(&item.id, ayah, Rating::Easy, today)?;
//! }
//!
//! let due = storage.due(today)?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod item;
pub mod srs;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Item model
pub use item::{
    CreateItemInput, ItemStats, MemorizationItem, PriorKnowledge, RangeError, VerseRange,
    AYAH_COUNTS, DEFAULT_EASE_FACTOR, SURAH_COUNT,
};

// Scheduling engine
pub use srs::{
    apply_item_rating, apply_unit_rating, compute_schedule, due_items, effective_age,
    partition_runs, reset_daily_completions, upcoming_items, RatedRun, Rating, RatingOutcome,
    RatingParseError, RoundError, ScheduleUpdate, ESTABLISHED_AGE_DAYS, FRESH_AGE_DAYS,
    MAX_EASE_FACTOR, MIN_EASE_FACTOR,
};

// Clock / timezone collaborator
pub use clock::Clock;

// Storage layer
pub use storage::{Result, Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Clock, CreateItemInput, ItemStats, MemorizationItem, PriorKnowledge, Rating,
        RatingOutcome, Result, ScheduleUpdate, Storage, StorageError, VerseRange,
    };
}
