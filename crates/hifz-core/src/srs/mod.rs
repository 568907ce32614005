//! SRS Module - Tiered spaced repetition for memorized passages
//!
//! Unlike generic flashcard schedulers, intervals here are tiered by the
//! passage's *effective age* (declared prior memorization plus elapsed
//! in-system days): fresh material is reviewed daily regardless of rating,
//! while long-held material spaces out to a week.
//!
//! ## Components
//! - `scheduler`: pure (age, rating) -> (interval, next review, ease)
//! - `rounds`: per-verse rating accumulation and split-on-divergence
//! - `queue`: due/upcoming selection and the daily completion reset

mod queue;
mod rounds;
mod scheduler;

pub use queue::{due_items, reset_daily_completions, upcoming_items};
pub use rounds::{
    apply_item_rating, apply_unit_rating, partition_runs, RatedRun, RatingOutcome, RoundError,
};
pub use scheduler::{
    compute_schedule, effective_age, Rating, RatingParseError, ScheduleUpdate,
    ESTABLISHED_AGE_DAYS, FRESH_AGE_DAYS, MAX_EASE_FACTOR, MIN_EASE_FACTOR,
};
