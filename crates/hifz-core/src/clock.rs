//! Clock / Timezone collaborator
//!
//! All "day" semantics in the engine are civil, not duration-based: a day
//! is a calendar date interpreted in the user's IANA zone, never a 24-hour
//! UTC offset. This module is the only place the wall clock is read; every
//! engine function takes the resolved `NaiveDate` as an explicit argument.

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;

/// Resolves the user's timezone and produces civil dates from it.
///
/// Zone resolution order: explicit argument > stored override >
/// host-detected zone > UTC. Resolution never fails - an unparseable or
/// undetectable zone degrades to UTC with a warning rather than failing
/// the whole call.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    zone_override: Option<Tz>,
}

impl Clock {
    /// Create a clock with no zone override (host zone or UTC)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock pinned to a specific zone name.
    ///
    /// Unknown names fall back to host detection at resolution time.
    pub fn with_zone(name: &str) -> Self {
        Self {
            zone_override: parse_zone(name),
        }
    }

    /// Set or clear the zone override
    pub fn set_zone_override(&mut self, name: Option<&str>) {
        self.zone_override = name.and_then(parse_zone);
    }

    /// Resolve the zone to use for civil-date arithmetic.
    ///
    /// Order: `explicit` > override > host-detected > UTC.
    pub fn resolve_user_zone(&self, explicit: Option<&str>) -> Tz {
        if let Some(tz) = explicit.and_then(parse_zone) {
            return tz;
        }
        if let Some(tz) = self.zone_override {
            return tz;
        }
        host_zone().unwrap_or(Tz::UTC)
    }

    /// The current civil date in the resolved zone
    pub fn today(&self) -> NaiveDate {
        let zone = self.resolve_user_zone(None);
        today_in(zone)
    }
}

/// Parse an IANA zone name, warning on failure
fn parse_zone(name: &str) -> Option<Tz> {
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            tracing::warn!("Unknown timezone '{}', falling back", name);
            None
        }
    }
}

/// Detect the host's IANA zone
fn host_zone() -> Option<Tz> {
    match iana_time_zone::get_timezone() {
        Ok(name) => parse_zone(&name),
        Err(e) => {
            tracing::warn!("Could not detect host timezone: {}", e);
            None
        }
    }
}

/// The current civil date in the given zone
pub fn today_in(zone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&zone).date_naive()
}

/// Civil-date addition: `date + n` calendar days.
///
/// Adds whole calendar days, not 24-hour multiples, so the result is
/// unaffected by DST transitions in the interval.
pub fn add_days(date: NaiveDate, n: u64) -> NaiveDate {
    date.checked_add_days(Days::new(n)).unwrap_or(NaiveDate::MAX)
}

/// Signed whole civil days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
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
    fn test_add_days_plain() {
        assert_eq!(add_days(date(2026, 1, 30), 3), date(2026, 2, 2));
    }

    #[test]
    fn test_add_days_across_dst_boundary() {
        // US DST starts 2026-03-08; civil addition must still land exactly
        // 7 calendar days later, not 7*24h later.
        assert_eq!(add_days(date(2026, 3, 5), 7), date(2026, 3, 12));
        // And across the fall-back transition (2026-11-01)
        assert_eq!(add_days(date(2026, 10, 29), 4), date(2026, 11, 2));
    }

    #[test]
    fn test_days_between_signed() {
        assert_eq!(days_between(date(2026, 1, 1), date(2026, 1, 11)), 10);
        assert_eq!(days_between(date(2026, 1, 11), date(2026, 1, 1)), -10);
    }

    #[test]
    fn test_resolve_explicit_beats_override() {
        let clock = Clock::with_zone("Asia/Riyadh");
        let zone = clock.resolve_user_zone(Some("Europe/London"));
        assert_eq!(zone, chrono_tz::Europe::London);
    }

    #[test]
    fn test_resolve_override() {
        let clock = Clock::with_zone("Asia/Jakarta");
        assert_eq!(clock.resolve_user_zone(None), chrono_tz::Asia::Jakarta);
    }

    #[test]
    fn test_unknown_zone_degrades() {
        let clock = Clock::with_zone("Not/AZone");
        // Falls through to host detection or UTC; must not panic and the
        // bogus name must not stick.
        let _ = clock.resolve_user_zone(None);
        assert!(clock.zone_override.is_none());
    }

    #[test]
    fn test_today_in_zone_consistency() {
        // Dates in adjacent zones differ by at most one calendar day
        let a = today_in(chrono_tz::Pacific::Kiritimati);
        let b = today_in(chrono_tz::Pacific::Midway);
        let diff = days_between(b, a);
        assert!((0..=1).contains(&diff), "unexpected spread: {}", diff);
    }
}
