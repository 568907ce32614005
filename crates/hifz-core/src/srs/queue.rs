//! Due-Set Selector and Daily Reset
//!
//! Pure, whole-collection sweeps over the item list. Collections are
//! bounded (hundreds of items per user), so these run fully in memory.
//!
//! `completed_today` is informational only: an item may legitimately be
//! reviewed more than once per calendar day, so the due set never filters
//! on it.

use chrono::NaiveDate;

use crate::clock;
use crate::item::MemorizationItem;

/// Deterministic ordering: next review date, then mushaf position
fn queue_order(a: &MemorizationItem, b: &MemorizationItem) -> std::cmp::Ordering {
    a.next_review
        .cmp(&b.next_review)
        .then(a.range.surah.cmp(&b.range.surah))
        .then(a.range.ayah_start.cmp(&b.range.ayah_start))
}

/// Items due on or before `today`, in deterministic queue order
pub fn due_items<'a>(
    items: &'a [MemorizationItem],
    today: NaiveDate,
) -> Vec<&'a MemorizationItem> {
    let mut due: Vec<&MemorizationItem> =
        items.iter().filter(|i| i.next_review <= today).collect();
    due.sort_by(|a, b| queue_order(a, b));
    due
}

/// Items scheduled within the next `days` days (inclusive on both ends),
/// sorted ascending by next review, then `(surah, ayah_start)` for
/// deterministic ties
pub fn upcoming_items<'a>(
    items: &'a [MemorizationItem],
    today: NaiveDate,
    days: u64,
) -> Vec<&'a MemorizationItem> {
    let horizon = clock::add_days(today, days);
    let mut upcoming: Vec<&MemorizationItem> = items
        .iter()
        .filter(|i| i.next_review >= today && i.next_review <= horizon)
        .collect();
    upcoming.sort_by(|a, b| queue_order(a, b));
    upcoming
}

/// Clear stale same-day completion markers.
///
/// Every `completed_today` set to a date other than `today` is cleared;
/// returns the ids of the items that changed so the caller can persist
/// them. Must run once per session before deriving due/upcoming, so a
/// review completed on a prior day never suppresses today's due list.
pub fn reset_daily_completions(items: &mut [MemorizationItem], today: NaiveDate) -> Vec<String> {
    let mut cleared = Vec::new();
    for item in items.iter_mut() {
        if let Some(marked) = item.completed_today {
            if marked != today {
                item.completed_today = None;
                cleared.push(item.id.clone());
            }
        }
    }
    cleared
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CreateItemInput;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item_due_on(surah: u16, start: u32, end: u32, next_review: NaiveDate) -> MemorizationItem {
        let input = CreateItemInput::for_range(surah, start, end);
        let mut item = MemorizationItem::create(input, date(2026, 1, 1)).unwrap();
        item.next_review = next_review;
        item
    }

    #[test]
    fn test_due_includes_past_and_today() {
        let today = date(2026, 3, 10);
        let items = vec![
            item_due_on(2, 1, 5, date(2026, 3, 9)),   // yesterday
            item_due_on(3, 1, 5, today),              // today
            item_due_on(4, 1, 5, date(2026, 3, 11)),  // tomorrow
        ];

        let due = due_items(&items, today);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].range.surah, 2);
        assert_eq!(due[1].range.surah, 3);
    }

    #[test]
    fn test_due_ignores_completed_today() {
        let today = date(2026, 3, 10);
        let mut item = item_due_on(2, 1, 5, today);
        item.completed_today = Some(today);
        let items = vec![item];

        // Completion is informational only; the item stays due
        assert_eq!(due_items(&items, today).len(), 1);
    }

    #[test]
    fn test_upcoming_window_inclusive() {
        let today = date(2026, 3, 10);
        let items = vec![
            item_due_on(2, 1, 5, date(2026, 3, 9)),  // past: excluded
            item_due_on(3, 1, 5, today),             // today: included
            item_due_on(4, 1, 5, date(2026, 3, 17)), // today+7: included
            item_due_on(5, 1, 5, date(2026, 3, 18)), // today+8: excluded
        ];

        let upcoming = upcoming_items(&items, today, 7);
        let surahs: Vec<u16> = upcoming.iter().map(|i| i.range.surah).collect();
        assert_eq!(surahs, vec![3, 4]);
    }

    #[test]
    fn test_item_due_today_in_both_views() {
        let today = date(2026, 3, 10);
        let items = vec![item_due_on(3, 1, 5, today)];
        assert_eq!(due_items(&items, today).len(), 1);
        assert_eq!(upcoming_items(&items, today, 7).len(), 1);
    }

    #[test]
    fn test_upcoming_sorted_with_deterministic_ties() {
        let today = date(2026, 3, 10);
        let tie_day = date(2026, 3, 12);
        let items = vec![
            item_due_on(3, 10, 12, tie_day),
            item_due_on(2, 20, 25, tie_day),
            item_due_on(2, 5, 9, tie_day),
            item_due_on(4, 1, 3, date(2026, 3, 11)),
        ];

        let upcoming = upcoming_items(&items, today, 7);
        let order: Vec<(u16, u32)> = upcoming
            .iter()
            .map(|i| (i.range.surah, i.range.ayah_start))
            .collect();
        assert_eq!(order, vec![(4, 1), (2, 5), (2, 20), (3, 10)]);
    }

    #[test]
    fn test_reset_clears_only_stale_markers() {
        let today = date(2026, 3, 10);
        let mut stale = item_due_on(2, 1, 5, today);
        stale.completed_today = Some(date(2026, 3, 9));
        let mut fresh = item_due_on(3, 1, 5, today);
        fresh.completed_today = Some(today);
        let unset = item_due_on(4, 1, 5, today);

        let mut items = vec![stale, fresh, unset];
        let cleared = reset_daily_completions(&mut items, today);

        assert_eq!(cleared, vec![items[0].id.clone()]);
        assert_eq!(items[0].completed_today, None);
        assert_eq!(items[1].completed_today, Some(today));
        assert_eq!(items[2].completed_today, None);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let today = date(2026, 3, 10);
        let mut item = item_due_on(2, 1, 5, today);
        item.completed_today = Some(date(2026, 3, 8));
        let mut items = vec![item];

        assert_eq!(reset_daily_completions(&mut items, today).len(), 1);
        assert_eq!(reset_daily_completions(&mut items, today).len(), 0);
    }
}
