//! Memorization Item - The scheduled unit of memorized text
//!
//! Each item covers a contiguous verse range with:
//! - Tiered spaced-repetition state (interval, next review, ease factor)
//! - An in-progress per-verse rating round, when one is open
//! - Descriptive metadata carried along but never interpreted by the
//!   scheduler

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::item::range::{RangeError, VerseRange};
use crate::srs::Rating;

// ============================================================================
// PRIOR KNOWLEDGE
// ============================================================================

/// How well the user already knew the passage when it entered the system.
///
/// Only used to seed the very first interval, before any rating exists.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorKnowledge {
    /// Not memorized yet
    #[default]
    New,
    /// Recently started
    Beginner,
    /// Partially solid
    Intermediate,
    /// Mostly solid
    Advanced,
    /// Fully memorized long ago
    Mastered,
}

impl PriorKnowledge {
    /// Seed interval in days for a freshly created item
    pub fn seed_interval(&self) -> u32 {
        match self {
            PriorKnowledge::New => 1,
            PriorKnowledge::Beginner => 2,
            PriorKnowledge::Intermediate => 5,
            PriorKnowledge::Advanced => 10,
            PriorKnowledge::Mastered => 20,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorKnowledge::New => "new",
            PriorKnowledge::Beginner => "beginner",
            PriorKnowledge::Intermediate => "intermediate",
            PriorKnowledge::Advanced => "advanced",
            PriorKnowledge::Mastered => "mastered",
        }
    }
}

impl std::fmt::Display for PriorKnowledge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PriorKnowledge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(PriorKnowledge::New),
            "beginner" => Ok(PriorKnowledge::Beginner),
            "intermediate" => Ok(PriorKnowledge::Intermediate),
            "advanced" => Ok(PriorKnowledge::Advanced),
            "mastered" => Ok(PriorKnowledge::Mastered),
            _ => Err(format!("Unknown prior knowledge level: {}", s)),
        }
    }
}

// ============================================================================
// MEMORIZATION ITEM
// ============================================================================

/// Default ease factor for new items
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// A memorized passage with its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorizationItem {
    /// Deterministic id derived from the range (see [`VerseRange::item_id`])
    pub id: String,
    /// The verse range this item covers
    #[serde(flatten)]
    pub range: VerseRange,

    // ========== Scheduling ==========
    /// Days until the next review (>= 1)
    pub interval: u32,
    /// Civil date of the next scheduled review
    pub next_review: NaiveDate,
    /// Ease factor, bounded to [1.3, 2.5]. Tracked and updated but not
    /// consulted by the interval tiers.
    pub ease_factor: f64,
    /// Completed review rounds
    pub review_count: i32,
    /// Civil date of the most recent rating event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<NaiveDate>,
    /// Day of the most recent rating event; cleared once that day passes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_today: Option<NaiveDate>,

    // ========== Age ==========
    /// Civil date the item entered the system
    pub created_at: NaiveDate,
    /// Days of prior, pre-system memorization declared by the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memorization_age: Option<i64>,

    // ========== Per-verse rating round ==========
    /// In-progress rating round: ayah number -> rating. Keys are always a
    /// subset of the range. Empty map = no round open.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub individual_ratings: BTreeMap<u32, Rating>,

    // ========== Descriptive metadata (opaque to the scheduler) ==========
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Ruku boundaries within the range, for display only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ruku_markers: Vec<u32>,
}

impl MemorizationItem {
    /// Create a new item from validated input.
    ///
    /// The seed interval comes from the declared prior-knowledge level and
    /// is only meaningful until the first rating arrives.
    pub fn create(input: CreateItemInput, today: NaiveDate) -> Result<Self, RangeError> {
        let range = VerseRange::new(input.surah, input.ayah_start, input.ayah_end)?;
        let interval = input.prior_knowledge.seed_interval();

        Ok(Self {
            id: range.item_id(),
            range,
            interval,
            next_review: clock::add_days(today, interval as u64),
            ease_factor: DEFAULT_EASE_FACTOR,
            review_count: 0,
            last_reviewed: None,
            completed_today: None,
            created_at: today,
            memorization_age: input.memorization_age,
            individual_ratings: BTreeMap::new(),
            name: input.name,
            description: input.description,
            tags: input.tags,
            ruku_markers: input.ruku_markers,
        })
    }

    /// Whether the item is due on the given civil date
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }

    /// Whether every ayah in the range has a recorded rating
    pub fn round_complete(&self) -> bool {
        self.range
            .ayat()
            .all(|ayah| self.individual_ratings.contains_key(&ayah))
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating a new memorization item
///
/// Uses `deny_unknown_fields` to prevent field injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateItemInput {
    /// Surah number (1-114)
    pub surah: u16,
    /// First ayah of the range
    pub ayah_start: u32,
    /// Last ayah of the range
    pub ayah_end: u32,
    /// Declared prior-knowledge level
    #[serde(default)]
    pub prior_knowledge: PriorKnowledge,
    /// Days of prior memorization before the item entered the system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memorization_age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ruku_markers: Vec<u32>,
}

impl CreateItemInput {
    /// Minimal input for a range with defaults everywhere else
    pub fn for_range(surah: u16, ayah_start: u32, ayah_end: u32) -> Self {
        Self {
            surah,
            ayah_start,
            ayah_end,
            prior_knowledge: PriorKnowledge::default(),
            memorization_age: None,
            name: None,
            description: None,
            tags: vec![],
            ruku_markers: vec![],
        }
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Statistics over the whole item collection
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    /// Total number of items
    pub total_items: i64,
    /// Items due on the reference date
    pub items_due: i64,
    /// Items with a rating event on the reference date
    pub reviewed_today: i64,
    /// Mean ease factor across all items
    pub average_ease_factor: f64,
    /// Earliest created_at
    pub oldest_item: Option<NaiveDate>,
    /// Latest created_at
    pub newest_item: Option<NaiveDate>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seed_intervals() {
        assert_eq!(PriorKnowledge::New.seed_interval(), 1);
        assert_eq!(PriorKnowledge::Beginner.seed_interval(), 2);
        assert_eq!(PriorKnowledge::Intermediate.seed_interval(), 5);
        assert_eq!(PriorKnowledge::Advanced.seed_interval(), 10);
        assert_eq!(PriorKnowledge::Mastered.seed_interval(), 20);
    }

    #[test]
    fn test_prior_knowledge_roundtrip() {
        for level in [
            PriorKnowledge::New,
            PriorKnowledge::Beginner,
            PriorKnowledge::Intermediate,
            PriorKnowledge::Advanced,
            PriorKnowledge::Mastered,
        ] {
            assert_eq!(level.as_str().parse::<PriorKnowledge>(), Ok(level));
        }
        assert!("expert".parse::<PriorKnowledge>().is_err());
    }

    #[test]
    fn test_create_seeds_schedule() {
        let mut input = CreateItemInput::for_range(2, 1, 5);
        input.prior_knowledge = PriorKnowledge::Intermediate;
        let today = date(2026, 3, 1);

        let item = MemorizationItem::create(input, today).unwrap();
        assert_eq!(item.interval, 5);
        assert_eq!(item.next_review, date(2026, 3, 6));
        assert_eq!(item.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(item.review_count, 0);
        assert_eq!(item.created_at, today);
        assert!(item.individual_ratings.is_empty());
        assert_eq!(item.id, item.range.item_id());
    }

    #[test]
    fn test_create_rejects_bad_range() {
        let input = CreateItemInput::for_range(1, 1, 8);
        assert!(MemorizationItem::create(input, date(2026, 3, 1)).is_err());
    }

    #[test]
    fn test_round_complete() {
        let input = CreateItemInput::for_range(2, 1, 3);
        let mut item = MemorizationItem::create(input, date(2026, 3, 1)).unwrap();
        assert!(!item.round_complete());

        item.individual_ratings.insert(1, Rating::Easy);
        item.individual_ratings.insert(2, Rating::Easy);
        assert!(!item.round_complete());

        item.individual_ratings.insert(3, Rating::Medium);
        assert!(item.round_complete());
    }

    #[test]
    fn test_serde_camel_case() {
        let input = CreateItemInput::for_range(2, 255, 255);
        let item = MemorizationItem::create(input, date(2026, 3, 1)).unwrap();
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"ayahStart\":255"));
        assert!(json.contains("\"nextReview\""));
        assert!(json.contains("\"easeFactor\""));

        let back: MemorizationItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
