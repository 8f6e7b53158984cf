//! Day boundaries of civil dates in an IANA timezone.
//!
//! Every range endpoint is kept as an absolute instant that sits on a day
//! boundary of the configured zone. The `try_*` functions report why a
//! conversion failed; the plain variants log the failure and return `None`
//! so callers can skip the operation.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Error, Result};

// Local times swallowed by a DST gap are probed in half-hour steps, up to four hours.
const GAP_PROBE_STEP_MINUTES: i64 = 30;
const GAP_PROBE_STEPS: i64 = 8;

pub fn resolve_zone(zone: &str) -> Result<Tz> {
    zone.parse::<Tz>()
        .map_err(|_| Error::UnknownZone(zone.to_string()))
}

pub fn is_valid_zone(zone: &str) -> bool {
    resolve_zone(zone).is_ok()
}

fn end_of_day_time() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default()
}

/// First instant whose wall clock in `tz` reads `local` or later.
fn earliest_instant(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    let found = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => (1..=GAP_PROBE_STEPS).find_map(|step| {
            let probe = local + Duration::minutes(step * GAP_PROBE_STEP_MINUTES);
            tz.from_local_datetime(&probe).earliest()
        }),
    };
    found
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::NonexistentLocalTime { local, zone: tz.name().to_string() })
}

/// Last instant whose wall clock in `tz` reads `local` or earlier.
fn latest_instant(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    let found = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(_, latest) => Some(latest),
        LocalResult::None => (1..=GAP_PROBE_STEPS).find_map(|step| {
            let probe = local - Duration::minutes(step * GAP_PROBE_STEP_MINUTES);
            tz.from_local_datetime(&probe).latest()
        }),
    };
    found
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::NonexistentLocalTime { local, zone: tz.name().to_string() })
}

pub fn try_start_of_day(date: NaiveDate, zone: &str) -> Result<DateTime<Utc>> {
    let tz = resolve_zone(zone)?;
    earliest_instant(tz, date.and_time(NaiveTime::default()))
}

pub fn try_end_of_day(date: NaiveDate, zone: &str) -> Result<DateTime<Utc>> {
    let tz = resolve_zone(zone)?;
    latest_instant(tz, date.and_time(end_of_day_time()))
}

pub fn try_civil_date(instant: DateTime<Utc>, zone: &str) -> Result<NaiveDate> {
    let tz = resolve_zone(zone)?;
    Ok(instant.with_timezone(&tz).date_naive())
}

/// Midnight of `date` in `zone`, as an absolute instant.
///
/// When midnight falls inside a DST gap the first wall-clock time that
/// exists on that date is used instead.
pub fn start_of_day(date: NaiveDate, zone: &str) -> Option<DateTime<Utc>> {
    try_start_of_day(date, zone)
        .map_err(|err| warn!(%date, zone, %err, "cannot compute start of day"))
        .ok()
}

/// 23:59:59.999 of `date` in `zone`, as an absolute instant.
pub fn end_of_day(date: NaiveDate, zone: &str) -> Option<DateTime<Utc>> {
    try_end_of_day(date, zone)
        .map_err(|err| warn!(%date, zone, %err, "cannot compute end of day"))
        .ok()
}

/// The calendar date `instant` falls on in `zone`.
pub fn civil_date(instant: DateTime<Utc>, zone: &str) -> Option<NaiveDate> {
    try_civil_date(instant, zone)
        .map_err(|err| warn!(%instant, zone, %err, "cannot convert instant to civil date"))
        .ok()
}

/// Start of the `zone` day that contains `instant`.
pub fn start_of_day_utc(instant: Option<DateTime<Utc>>, zone: &str) -> Option<DateTime<Utc>> {
    let date = civil_date(instant?, zone)?;
    start_of_day(date, zone)
}

/// End of the `zone` day that contains `instant`.
pub fn end_of_day_utc(instant: Option<DateTime<Utc>>, zone: &str) -> Option<DateTime<Utc>> {
    let date = civil_date(instant?, zone)?;
    end_of_day(date, zone)
}

/// Formats `instant` as wall-clock text in `zone` using a chrono format string.
pub fn format_in_zone(instant: DateTime<Utc>, zone: &str, fmt: &str) -> Option<String> {
    let tz = resolve_zone(zone)
        .map_err(|err| warn!(%instant, zone, %err, "cannot format instant"))
        .ok()?;
    Some(instant.with_timezone(&tz).format(fmt).to_string())
}
