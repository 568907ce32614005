//! Rating Aggregator / Splitter
//!
//! A composite item can have each ayah in its range rated independently
//! during a "round". While the round is open, ratings just accumulate.
//! Once every ayah is rated the round resolves: identical ratings yield a
//! single uniform schedule update, differing ratings fragment the item
//! into maximal contiguous runs of equal rating, each independently
//! scheduled from that point on.
//!
//! Everything here is pure: functions take an item snapshot and return a
//! new snapshot (or fragments). The caller commits the outcome to the
//! store - for a split, that means deleting the original id and inserting
//! the fragments atomically.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::item::{MemorizationItem, VerseRange};
use crate::srs::scheduler::{compute_schedule, effective_age, Rating};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Rating-round error
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    /// The rated ayah is not inside the item's range
    #[error("Ayah {ayah} outside item range {range}")]
    UnitOutOfRange { ayah: u32, range: String },
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of applying one per-verse rating
#[derive(Debug, Clone, PartialEq)]
pub enum RatingOutcome {
    /// Round still open: rating recorded, no schedule change.
    /// Upsert the item.
    Partial(MemorizationItem),
    /// Round resolved with a single common rating: schedule recomputed.
    /// Upsert the item.
    Uniform(MemorizationItem),
    /// Round resolved with differing ratings: the item fragments.
    /// Delete the original id and insert the fragments atomically.
    Split(Vec<MemorizationItem>),
}

impl RatingOutcome {
    /// Whether this outcome resolved the round
    pub fn resolved(&self) -> bool {
        !matches!(self, RatingOutcome::Partial(_))
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Apply a per-verse rating to an item.
///
/// - Ratings accumulate in `individual_ratings` until the whole range is
///   covered; until then each call is a [`RatingOutcome::Partial`] that
///   only records the rating and stamps `last_reviewed`/`completed_today`.
/// - The call that completes coverage resolves the round: uniform ratings
///   recompute the schedule in place, mixed ratings split the item.
/// - `review_count` is incremented exactly once per round, keyed off the
///   coverage transition, so resubmitting an already-complete round is a
///   no-op.
/// - A rating that arrives while a resolved round is still held for
///   display begins a new round, unless it merely repeats an entry of the
///   resolved round.
pub fn apply_unit_rating(
    item: &MemorizationItem,
    ayah: u32,
    rating: Rating,
    today: NaiveDate,
) -> Result<RatingOutcome, RoundError> {
    if !item.range.contains(ayah) {
        return Err(RoundError::UnitOutOfRange {
            ayah,
            range: item.range.to_string(),
        });
    }

    let covered_before = item.round_complete();
    if covered_before && item.individual_ratings.get(&ayah) == Some(&rating) {
        // Resubmission against an already-resolved round: pure no-op so a
        // duplicate submit can never double-increment review_count.
        return Ok(RatingOutcome::Partial(item.clone()));
    }

    let mut updated = item.clone();
    if covered_before {
        // The previous round was resolved and retained for display; this
        // rating opens a new round.
        updated.individual_ratings.clear();
    }
    updated.individual_ratings.insert(ayah, rating);
    updated.last_reviewed = Some(today);
    updated.completed_today = Some(today);

    if !updated.round_complete() {
        return Ok(RatingOutcome::Partial(updated));
    }

    let runs = partition_runs(&updated.individual_ratings);
    if runs.len() == 1 {
        // Uniform resolution: one schedule update for the whole range.
        let common = runs[0].rating;
        let age = effective_age(updated.created_at, updated.memorization_age, today);
        let schedule = compute_schedule(age, common, updated.ease_factor, today);
        updated.interval = schedule.interval;
        updated.next_review = schedule.next_review;
        updated.ease_factor = schedule.ease_factor;
        updated.review_count += 1;
        // Ratings retained for display until the next round begins
        Ok(RatingOutcome::Uniform(updated))
    } else {
        Ok(RatingOutcome::Split(split_into_fragments(
            &updated, &runs, today,
        )))
    }
}

/// Whole-item rating: every ayah treated uniformly in a single event.
///
/// Recomputes the schedule, increments `review_count`, and discards any
/// open round.
pub fn apply_item_rating(
    item: &MemorizationItem,
    rating: Rating,
    today: NaiveDate,
) -> MemorizationItem {
    let mut updated = item.clone();
    let age = effective_age(updated.created_at, updated.memorization_age, today);
    let schedule = compute_schedule(age, rating, updated.ease_factor, today);
    updated.interval = schedule.interval;
    updated.next_review = schedule.next_review;
    updated.ease_factor = schedule.ease_factor;
    updated.review_count += 1;
    updated.last_reviewed = Some(today);
    updated.completed_today = Some(today);
    updated.individual_ratings.clear();
    updated
}

// ============================================================================
// PARTITION
// ============================================================================

/// A maximal contiguous run of equally-rated ayat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatedRun {
    /// First ayah of the run (inclusive)
    pub start: u32,
    /// Last ayah of the run (inclusive)
    pub end: u32,
    /// The run's common rating
    pub rating: Rating,
}

/// Partition a complete rating map into maximal contiguous runs.
///
/// Single left-to-right scan, cutting exactly where adjacent ratings
/// differ. No majority or other heuristic. The map's sorted keys are
/// assumed contiguous (a complete round over an inclusive range).
pub fn partition_runs(ratings: &BTreeMap<u32, Rating>) -> Vec<RatedRun> {
    let mut runs: Vec<RatedRun> = Vec::new();

    for (&ayah, &rating) in ratings {
        match runs.last_mut() {
            Some(run) if run.rating == rating && ayah == run.end + 1 => run.end = ayah,
            _ => runs.push(RatedRun {
                start: ayah,
                end: ayah,
                rating,
            }),
        }
    }

    runs
}

/// Synthesize fragment items from the partitioned runs.
///
/// Each fragment takes a fresh range-derived id, copies the descriptive
/// fields plus `created_at`/`memorization_age` from the original, gets a
/// schedule from its run's rating, and starts a fresh (empty) round.
fn split_into_fragments(
    original: &MemorizationItem,
    runs: &[RatedRun],
    today: NaiveDate,
) -> Vec<MemorizationItem> {
    let age = effective_age(original.created_at, original.memorization_age, today);

    runs.iter()
        .map(|run| {
            let range = VerseRange {
                surah: original.range.surah,
                ayah_start: run.start,
                ayah_end: run.end,
            };
            let schedule = compute_schedule(age, run.rating, original.ease_factor, today);

            MemorizationItem {
                id: range.item_id(),
                range,
                interval: schedule.interval,
                next_review: schedule.next_review,
                ease_factor: schedule.ease_factor,
                review_count: original.review_count + 1,
                last_reviewed: Some(today),
                completed_today: Some(today),
                created_at: original.created_at,
                memorization_age: original.memorization_age,
                individual_ratings: BTreeMap::new(),
                name: original.name.clone(),
                description: original.description.clone(),
                tags: original.tags.clone(),
                ruku_markers: original
                    .ruku_markers
                    .iter()
                    .copied()
                    .filter(|m| range.contains(*m))
                    .collect(),
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
