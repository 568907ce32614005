//! Verse Range - Identity model for memorization items
//!
//! An item's identity is derived deterministically from its range: two
//! items denote the same stored passage iff `(surah, ayah_start, ayah_end)`
//! match, which the store expresses as id equality. Editing a range
//! therefore always changes identity - the caller deletes the old id and
//! inserts the new one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of surahs in the mushaf
pub const SURAH_COUNT: u16 = 114;

/// Ayah count per surah, Kufan/Hafs numbering. Indexed by `surah - 1`.
pub const AYAH_COUNTS: [u32; SURAH_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Namespace for range-derived item ids (UUID v5)
const ITEM_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x8f, 0x1c, 0x2a, 0x4d, 0x6e, 0x90, 0x5b, 0x31, 0x9a, 0x7f, 0x3d, 0x58, 0xc6, 0x02, 0xe4,
    0x7b,
]);

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Range validation error - rejected before any item is constructed
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Surah number outside 1..=114
    #[error("Surah {0} out of range (expected 1-114)")]
    SurahOutOfRange(u16),
    /// Ayah start below 1
    #[error("Ayah start must be at least 1, got {0}")]
    AyahStartBelowOne(u32),
    /// Range bounds unordered
    #[error("Ayah range unordered: start {start} > end {end}")]
    Unordered { start: u32, end: u32 },
    /// Ayah end past the surah's last ayah
    #[error("Ayah {ayah} past the end of surah {surah} ({max} ayat)")]
    AyahPastSurahEnd { surah: u16, ayah: u32, max: u32 },
}

// ============================================================================
// VERSE RANGE
// ============================================================================

/// An inclusive range of ayat within a single surah
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRange {
    /// Surah number (1-114)
    pub surah: u16,
    /// First ayah of the range (1-based, inclusive)
    pub ayah_start: u32,
    /// Last ayah of the range (inclusive)
    pub ayah_end: u32,
}

impl VerseRange {
    /// Construct a validated range
    pub fn new(surah: u16, ayah_start: u32, ayah_end: u32) -> Result<Self, RangeError> {
        let range = Self {
            surah,
            ayah_start,
            ayah_end,
        };
        range.validate()?;
        Ok(range)
    }

    /// Validate bounds against the mushaf
    pub fn validate(&self) -> Result<(), RangeError> {
        if self.surah < 1 || self.surah > SURAH_COUNT {
            return Err(RangeError::SurahOutOfRange(self.surah));
        }
        if self.ayah_start < 1 {
            return Err(RangeError::AyahStartBelowOne(self.ayah_start));
        }
        if self.ayah_start > self.ayah_end {
            return Err(RangeError::Unordered {
                start: self.ayah_start,
                end: self.ayah_end,
            });
        }
        let max = AYAH_COUNTS[(self.surah - 1) as usize];
        if self.ayah_end > max {
            return Err(RangeError::AyahPastSurahEnd {
                surah: self.surah,
                ayah: self.ayah_end,
                max,
            });
        }
        Ok(())
    }

    /// Deterministic item id for this range.
    ///
    /// UUID v5 over the canonical `"surah:start-end"` form, so the same
    /// range always derives the same id and distinct ranges never collide.
    pub fn item_id(&self) -> String {
        Uuid::new_v5(&ITEM_ID_NAMESPACE, self.canonical().as_bytes()).to_string()
    }

    /// Canonical textual form, e.g. `"2:255-255"`
    pub fn canonical(&self) -> String {
        format!("{}:{}-{}", self.surah, self.ayah_start, self.ayah_end)
    }

    /// Whether the given ayah falls inside the range
    pub fn contains(&self, ayah: u32) -> bool {
        ayah >= self.ayah_start && ayah <= self.ayah_end
    }

    /// Number of ayat in the range
    pub fn len(&self) -> u32 {
        self.ayah_end - self.ayah_start + 1
    }

    /// A single-ayah range is never empty, but the trait pair is expected
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the ayah numbers in the range
    pub fn ayat(&self) -> impl Iterator<Item = u32> + use<> {
        self.ayah_start..=self.ayah_end
    }
}

impl std::fmt::Display for VerseRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ayah_start == self.ayah_end {
            write!(f, "{}:{}", self.surah, self.ayah_start)
        } else {
            write!(f, "{}:{}-{}", self.surah, self.ayah_start, self.ayah_end)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_deterministic() {
        let a = VerseRange::new(2, 1, 5).unwrap();
        let b = VerseRange::new(2, 1, 5).unwrap();
        assert_eq!(a.item_id(), b.item_id());
    }

    #[test]
    fn test_id_distinguishes_ranges() {
        let a = VerseRange::new(2, 1, 5).unwrap();
        let b = VerseRange::new(2, 1, 6).unwrap();
        let c = VerseRange::new(3, 1, 5).unwrap();
        assert_ne!(a.item_id(), b.item_id());
        assert_ne!(a.item_id(), c.item_id());
    }

    #[test]
    fn test_surah_bounds() {
        assert_eq!(
            VerseRange::new(0, 1, 1),
            Err(RangeError::SurahOutOfRange(0))
        );
        assert_eq!(
            VerseRange::new(115, 1, 1),
            Err(RangeError::SurahOutOfRange(115))
        );
        assert!(VerseRange::new(114, 1, 6).is_ok());
    }

    #[test]
    fn test_unordered_rejected() {
        assert_eq!(
            VerseRange::new(2, 5, 3),
            Err(RangeError::Unordered { start: 5, end: 3 })
        );
    }

    #[test]
    fn test_ayah_past_surah_end() {
        // Al-Fatihah has 7 ayat
        assert_eq!(
            VerseRange::new(1, 1, 8),
            Err(RangeError::AyahPastSurahEnd {
                surah: 1,
                ayah: 8,
                max: 7
            })
        );
        assert!(VerseRange::new(1, 1, 7).is_ok());
    }

    #[test]
    fn test_zero_ayah_start_rejected() {
        assert_eq!(
            VerseRange::new(2, 0, 5),
            Err(RangeError::AyahStartBelowOne(0))
        );
    }

    #[test]
    fn test_contains_and_len() {
        let range = VerseRange::new(2, 3, 7).unwrap();
        assert!(range.contains(3));
        assert!(range.contains(7));
        assert!(!range.contains(2));
        assert!(!range.contains(8));
        assert_eq!(range.len(), 5);
        assert_eq!(range.ayat().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_display() {
        assert_eq!(VerseRange::new(2, 255, 255).unwrap().to_string(), "2:255");
        assert_eq!(VerseRange::new(2, 1, 5).unwrap().to_string(), "2:1-5");
    }

    #[test]
    fn test_ayah_counts_table() {
        assert_eq!(AYAH_COUNTS[0], 7); // Al-Fatihah
        assert_eq!(AYAH_COUNTS[1], 286); // Al-Baqarah
        assert_eq!(AYAH_COUNTS[113], 6); // An-Nas
        let total: u32 = AYAH_COUNTS.iter().sum();
        assert_eq!(total, 6236);
    }
}
