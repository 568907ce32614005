//! Item module - Identity/range model and the memorization data model
//!
//! - Deterministic range-derived identity ([`VerseRange::item_id`])
//! - The scheduled unit of memorized text ([`MemorizationItem`])
//! - Creation input with prior-knowledge seeding

mod node;
mod range;

pub use node::{
    CreateItemInput, ItemStats, MemorizationItem, PriorKnowledge, DEFAULT_EASE_FACTOR,
};
pub use range::{RangeError, VerseRange, AYAH_COUNTS, SURAH_COUNT};
