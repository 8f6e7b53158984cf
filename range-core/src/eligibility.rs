use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::zone::{civil_date, start_of_day};

/// `max_past_days` value that disables the look-back limit.
pub const UNLIMITED_PAST_DAYS: i32 = -1;

/// Flags days that start before a look-back cutoff in a timezone.
///
/// The cutoff is resolved once, at construction, from "now".
#[derive(Debug, Clone)]
pub struct PastDateFilter {
    zone: String,
    cutoff: Option<DateTime<Utc>>,
}

impl PastDateFilter {
    pub fn new(zone: &str, max_past_days: i32, now: DateTime<Utc>) -> Self {
        let cutoff = u32::try_from(max_past_days)
            .ok()
            .and_then(|days| cutoff_instant(zone, days, now));
        Self {
            zone: zone.to_string(),
            cutoff,
        }
    }

    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }

    pub fn is_ineligible(&self, day: NaiveDate) -> bool {
        let Some(cutoff) = self.cutoff else {
            return false;
        };
        start_of_day(day, &self.zone).is_some_and(|start| start < cutoff)
    }
}

/// Start of the day `days` civil days before today in `zone`.
fn cutoff_instant(zone: &str, days: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = civil_date(now, zone)?;
    let earliest = today.checked_sub_days(Days::new(u64::from(days)))?;
    start_of_day(earliest, zone)
}

pub fn is_ineligible(day: NaiveDate, zone: &str, max_past_days: i32, now: DateTime<Utc>) -> bool {
    PastDateFilter::new(zone, max_past_days, now).is_ineligible(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_seven_day_boundary_is_exact() {
        // 2025-06-15 09:00 in Calcutta.
        let now = utc("2025-06-15T03:30:00Z");
        let filter = PastDateFilter::new("Asia/Calcutta", 7, now);
        assert!(!filter.is_ineligible(date(2025, 6, 8)));
        assert!(filter.is_ineligible(date(2025, 6, 7)));
        assert!(!filter.is_ineligible(date(2025, 6, 15)));
        assert!(!filter.is_ineligible(date(2025, 7, 1)));
    }

    #[test]
    fn test_today_follows_the_zone_not_utc() {
        // Still 2025-06-14 in UTC, already the 15th in Calcutta.
        let now = utc("2025-06-14T20:00:00Z");
        assert!(!is_ineligible(date(2025, 6, 8), "Asia/Calcutta", 7, now));
        assert!(is_ineligible(date(2025, 6, 7), "Asia/Calcutta", 7, now));
        assert!(!is_ineligible(date(2025, 6, 7), "UTC", 7, now));
    }

    #[test]
    fn test_unlimited_never_disables() {
        let now = utc("2025-06-15T00:00:00Z");
        assert!(!is_ineligible(date(1900, 1, 1), "UTC", UNLIMITED_PAST_DAYS, now));
        assert!(PastDateFilter::new("UTC", UNLIMITED_PAST_DAYS, now).cutoff().is_none());
    }

    #[test]
    fn test_zero_days_allows_only_today_onwards() {
        let now = utc("2025-06-15T12:00:00Z");
        assert!(is_ineligible(date(2025, 6, 14), "UTC", 0, now));
        assert!(!is_ineligible(date(2025, 6, 15), "UTC", 0, now));
    }

    #[test]
    fn test_unknown_zone_is_treated_as_eligible() {
        let now = utc("2025-06-15T12:00:00Z");
        assert!(!is_ineligible(date(2000, 1, 1), "Bogus/Zone", 7, now));
    }

    #[test]
    fn test_cutoff_across_dst_uses_civil_days() {
        // New York moved to EDT on 2025-03-09; a 7-day look-back from the
        // 12th must still start at local midnight on the 5th.
        let now = utc("2025-03-12T16:00:00Z");
        let filter = PastDateFilter::new("America/New_York", 7, now);
        assert_eq!(filter.cutoff(), Some(utc("2025-03-05T05:00:00Z")));
        assert!(!filter.is_ineligible(date(2025, 3, 5)));
        assert!(filter.is_ineligible(date(2025, 3, 4)));
    }
}
