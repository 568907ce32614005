//! Schedule Calculator
//!
//! Pure mapping from (effective age, rating) to the next interval and
//! review date. Intervals are tiered by how long the passage has been
//! memorized: freshly memorized material is reviewed daily no matter how
//! it was rated, while long-held material can be spaced out to a week.
//!
//! All date arithmetic is civil (calendar days in the user's zone), so a
//! DST transition inside the interval cannot shift the review date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock;

// ============================================================================
// RATING
// ============================================================================

/// Unknown rating symbol - rejected before any state changes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rating '{0}' (expected easy, medium, or hard)")]
pub struct RatingParseError(pub String);

/// How a review went, as reported by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Recalled without hesitation
    Easy,
    /// Recalled with effort
    Medium,
    /// Struggled or failed to recall
    Hard,
}

impl Rating {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Easy => "easy",
            Rating::Medium => "medium",
            Rating::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = RatingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Rating::Easy),
            "medium" => Ok(Rating::Medium),
            "hard" => Ok(Rating::Hard),
            other => Err(RatingParseError(other.to_string())),
        }
    }
}

// ============================================================================
// TIER CONSTANTS
// ============================================================================

/// Below this effective age (days), the interval is always 1 day
pub const FRESH_AGE_DAYS: i64 = 10;

/// At or above this effective age, the long-held tier applies
pub const ESTABLISHED_AGE_DAYS: i64 = 180;

/// Ease factor bounds
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Upper ease factor bound
pub const MAX_EASE_FACTOR: f64 = 2.5;

// ============================================================================
// SCHEDULE
// ============================================================================

/// Result of a schedule computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    /// Days until the next review (>= 1)
    pub interval: u32,
    /// Civil date of the next review (>= today)
    pub next_review: NaiveDate,
    /// Updated ease factor, clamped to [1.3, 2.5]
    pub ease_factor: f64,
}

/// Effective memorization age in days: declared prior history plus whole
/// civil days elapsed in the system. Recomputed on every call, never
/// cached, so it cannot drift.
pub fn effective_age(
    created_at: NaiveDate,
    memorization_age: Option<i64>,
    today: NaiveDate,
) -> i64 {
    let declared = memorization_age.unwrap_or(0);
    let elapsed = clock::days_between(created_at, today).max(0);
    (declared + elapsed).max(0)
}

/// Interval tier lookup. The ease factor deliberately plays no part here.
fn interval_for(effective_age: i64, rating: Rating) -> u32 {
    if effective_age < FRESH_AGE_DAYS {
        // Freshly memorized material is never spaced out, even on "easy"
        1
    } else if effective_age < ESTABLISHED_AGE_DAYS {
        match rating {
            Rating::Easy => 4,
            Rating::Medium => 2,
            Rating::Hard => 1,
        }
    } else {
        match rating {
            Rating::Easy => 7,
            Rating::Medium => 4,
            Rating::Hard => 1,
        }
    }
}

/// Ease factor adjustment per rating
fn ease_delta(rating: Rating) -> f64 {
    match rating {
        Rating::Easy => 0.1,
        Rating::Medium => 0.0,
        Rating::Hard => -0.15,
    }
}

/// Compute the next schedule from an item's effective age and a rating.
///
/// Guarantees: `interval >= 1`, `next_review >= today`, ease factor in
/// [1.3, 2.5]. The ease factor is updated but never consulted by the
/// interval tiers.
pub fn compute_schedule(
    effective_age: i64,
    rating: Rating,
    ease_factor: f64,
    today: NaiveDate,
) -> ScheduleUpdate {
    let interval = interval_for(effective_age, rating).max(1);

    ScheduleUpdate {
        interval,
        next_review: clock::add_days(today, interval as u64),
        ease_factor: (ease_factor + ease_delta(rating)).clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR),
    }
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

    const TODAY: fn() -> NaiveDate = || date(2026, 3, 1);

    #[test]
    fn test_fresh_tier_ignores_rating() {
        for rating in [Rating::Easy, Rating::Medium, Rating::Hard] {
            let update = compute_schedule(5, rating, 2.5, TODAY());
            assert_eq!(update.interval, 1, "age 5, rating {}", rating);
        }
    }

    #[test]
    fn test_middle_tier_intervals() {
        assert_eq!(compute_schedule(50, Rating::Easy, 2.5, TODAY()).interval, 4);
        assert_eq!(
            compute_schedule(50, Rating::Medium, 2.5, TODAY()).interval,
            2
        );
        assert_eq!(compute_schedule(50, Rating::Hard, 2.5, TODAY()).interval, 1);
    }

    #[test]
    fn test_established_tier_intervals() {
        assert_eq!(
            compute_schedule(200, Rating::Easy, 2.5, TODAY()).interval,
            7
        );
        assert_eq!(
            compute_schedule(200, Rating::Medium, 2.5, TODAY()).interval,
            4
        );
        assert_eq!(
            compute_schedule(200, Rating::Hard, 2.5, TODAY()).interval,
            1
        );
    }

    #[test]
    fn test_tier_boundaries() {
        // age 9 -> tier 1, age 10 -> tier 2
        assert_eq!(compute_schedule(9, Rating::Easy, 2.5, TODAY()).interval, 1);
        assert_eq!(compute_schedule(10, Rating::Easy, 2.5, TODAY()).interval, 4);
        // age 179 -> tier 2, age 180 -> tier 3
        assert_eq!(
            compute_schedule(179, Rating::Easy, 2.5, TODAY()).interval,
            4
        );
        assert_eq!(
            compute_schedule(180, Rating::Easy, 2.5, TODAY()).interval,
            7
        );
    }

    #[test]
    fn test_next_review_is_civil_addition() {
        let update = compute_schedule(200, Rating::Easy, 2.5, date(2026, 3, 5));
        // Crosses the US spring-forward transition; still exactly 7 days
        assert_eq!(update.next_review, date(2026, 3, 12));
        assert!(update.next_review > date(2026, 3, 5));
    }

    #[test]
    fn test_ease_factor_deltas() {
        let today = TODAY();
        assert_eq!(
            compute_schedule(50, Rating::Easy, 2.0, today).ease_factor,
            2.1
        );
        assert_eq!(
            compute_schedule(50, Rating::Medium, 2.0, today).ease_factor,
            2.0
        );
        assert_eq!(
            compute_schedule(50, Rating::Hard, 2.0, today).ease_factor,
            1.85
        );
    }

    #[test]
    fn test_ease_factor_clamped_under_repeated_extremes() {
        let today = TODAY();
        let mut ease = MAX_EASE_FACTOR;
        for _ in 0..50 {
            ease = compute_schedule(50, Rating::Easy, ease, today).ease_factor;
            assert!(ease <= MAX_EASE_FACTOR);
        }
        assert_eq!(ease, MAX_EASE_FACTOR);

        for _ in 0..50 {
            ease = compute_schedule(50, Rating::Hard, ease, today).ease_factor;
            assert!(ease >= MIN_EASE_FACTOR);
        }
        assert_eq!(ease, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_effective_age_combines_declared_and_elapsed() {
        let created = date(2026, 1, 1);
        assert_eq!(effective_age(created, None, date(2026, 1, 11)), 10);
        assert_eq!(effective_age(created, Some(30), date(2026, 1, 11)), 40);
        // created_at in the future must not produce a negative age
        assert_eq!(effective_age(date(2026, 6, 1), None, date(2026, 1, 1)), 0);
    }

    #[test]
    fn test_rating_parse() {
        assert_eq!("easy".parse::<Rating>(), Ok(Rating::Easy));
        assert_eq!("MEDIUM".parse::<Rating>(), Ok(Rating::Medium));
        assert_eq!("hard".parse::<Rating>(), Ok(Rating::Hard));
        assert!("good".parse::<Rating>().is_err());
        assert!("".parse::<Rating>().is_err());
    }

    #[test]
    fn test_interval_never_below_one() {
        for age in [0, 9, 10, 179, 180, 10_000] {
            for rating in [Rating::Easy, Rating::Medium, Rating::Hard] {
                let update = compute_schedule(age, rating, 1.3, TODAY());
                assert!(update.interval >= 1);
                assert!(update.next_review > TODAY());
            }
        }
    }
}
