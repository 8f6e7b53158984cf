//! The date-range picker's interaction state: a trigger showing the
//! committed range and a popover holding a provisional selection that only
//! reaches the caller on apply.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::eligibility::{PastDateFilter, UNLIMITED_PAST_DAYS};
use crate::error::{Error, Result};
use crate::month::{generate, CalendarDay, DisplayMonth};
use crate::selection::{DateRange, Selection};
use crate::zone::{civil_date, end_of_day, format_in_zone, is_valid_zone, start_of_day};

const TRIGGER_DATE_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// IANA zone whose day boundaries the range snaps to
    pub timezone: String,
    /// How many days back from today may be picked, -1 for no limit
    pub max_past_days: i32,
    /// Trigger text while nothing is committed
    pub placeholder: String,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Calcutta".to_string(),
            max_past_days: 90,
            placeholder: "Select Registration Dates".to_string(),
        }
    }
}

impl PickerConfig {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_zone(&self.timezone) {
            return Err(Error::UnknownZone(self.timezone.clone()));
        }
        if self.max_past_days < UNLIMITED_PAST_DAYS {
            return Err(Error::InvalidConfig(format!(
                "max_past_days must be -1 or greater, got {}",
                self.max_past_days
            )));
        }
        Ok(())
    }
}

/// Highlight state of one grid cell against the provisional selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayState {
    pub is_selected_from: bool,
    pub is_selected_to: bool,
    pub is_in_range: bool,
    pub is_selected: bool,
}

#[derive(Debug)]
pub struct DateRangePicker {
    config: PickerConfig,
    clock: Box<dyn Clock>,
    committed: DateRange,
    provisional: Selection<NaiveDate>,
    display_month: DisplayMonth,
    is_open: bool,
}

impl DateRangePicker {
    pub fn new(config: PickerConfig, committed: DateRange) -> Self {
        Self::with_clock(config, committed, SystemClock)
    }

    pub fn with_clock(config: PickerConfig, committed: DateRange, clock: impl Clock + 'static) -> Self {
        let mut picker = Self {
            config,
            clock: Box::new(clock),
            committed,
            provisional: Selection::Empty,
            display_month: DisplayMonth::containing(NaiveDate::default()),
            is_open: false,
        };
        picker.reseed();
        picker
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn committed(&self) -> DateRange {
        self.committed
    }

    pub fn selection(&self) -> Selection<NaiveDate> {
        self.provisional
    }

    pub fn display_month(&self) -> DisplayMonth {
        self.display_month
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Today in the configured zone, or in UTC when the zone cannot be resolved.
    pub fn today(&self) -> NaiveDate {
        let now = self.clock.now();
        civil_date(now, &self.config.timezone).unwrap_or_else(|| now.date_naive())
    }

    fn civil(&self, instant: Option<DateTime<Utc>>) -> Option<NaiveDate> {
        instant.and_then(|at| civil_date(at, &self.config.timezone))
    }

    /// Resets the provisional selection and display month from the committed range.
    fn reseed(&mut self) {
        let from = self.civil(self.committed.from);
        let to = self.civil(self.committed.to);
        self.provisional = Selection::from_endpoints(from, to);
        self.display_month = DisplayMonth::containing(from.unwrap_or_else(|| self.today()));
    }

    /// Replaces the committed copy with the caller's value. While the panel is
    /// open the provisional selection is left alone.
    pub fn set_value(&mut self, range: DateRange) {
        self.committed = range;
        if !self.is_open {
            self.reseed();
        }
    }

    pub fn open(&mut self) {
        self.reseed();
        self.is_open = true;
        debug!(month = %self.display_month.label(), "picker opened");
    }

    pub fn toggle(&mut self) {
        if self.is_open {
            self.cancel();
        } else {
            self.open();
        }
    }

    /// Drops the provisional selection and closes without notifying anyone.
    pub fn cancel(&mut self) {
        if self.is_open {
            debug!(selection = ?self.provisional, "picker cancelled");
        }
        self.is_open = false;
        self.reseed();
    }

    pub fn close(&mut self) {
        self.cancel();
    }

    /// A pointer press outside the trigger and the panel.
    pub fn outside_interaction(&mut self) {
        if self.is_open {
            self.cancel();
        }
    }

    pub fn navigate_month(&mut self, delta: i32) {
        self.display_month = self.display_month.shift(delta);
    }

    pub fn next_month(&mut self) {
        self.navigate_month(1);
    }

    pub fn prev_month(&mut self) {
        self.navigate_month(-1);
    }

    pub fn past_filter(&self) -> PastDateFilter {
        PastDateFilter::new(&self.config.timezone, self.config.max_past_days, self.clock.now())
    }

    /// The grid for the display month, recomputed on every call.
    pub fn calendar_days(&self) -> Vec<CalendarDay> {
        let filter = self.past_filter();
        generate(self.display_month, |day| filter.is_ineligible(day))
    }

    /// Feeds a click on `day` to the selection. Returns whether it was accepted.
    pub fn select_day(&mut self, day: &CalendarDay) -> bool {
        if !self.is_open || !day.is_current_month || day.is_disabled {
            return false;
        }
        self.provisional = self.provisional.click(day.date);
        debug!(day = %day.date, selection = ?self.provisional, "day selected");
        true
    }

    pub fn can_apply(&self) -> bool {
        self.is_open && !self.provisional.is_empty()
    }

    /// Commits the provisional selection as zone day boundaries and closes
    /// the panel. Returns the new range for the caller, or `None` when there
    /// was nothing to apply or the zone could not be resolved.
    pub fn apply(&mut self) -> Option<DateRange> {
        if !self.can_apply() {
            return None;
        }
        let (from_day, to_day) = self.provisional.finish()?;
        let zone = self.config.timezone.as_str();
        let Some(from) = start_of_day(from_day, zone) else {
            warn!(zone, %from_day, "apply skipped, start of range unresolved");
            return None;
        };
        let to = match to_day {
            Some(day) => match end_of_day(day, zone) {
                Some(end) => Some(end),
                None => {
                    warn!(zone, %day, "apply skipped, end of range unresolved");
                    return None;
                }
            },
            None => None,
        };

        let range = DateRange::new(Some(from), to);
        info!(from = %from, to = ?to, "date range applied");
        self.committed = range;
        self.is_open = false;
        self.reseed();
        Some(range)
    }

    pub fn day_state(&self, date: NaiveDate) -> DayState {
        DayState {
            is_selected_from: self.provisional.from() == Some(date),
            is_selected_to: self.provisional.to() == Some(date),
            is_in_range: self.provisional.is_inside(date),
            is_selected: self.provisional.is_endpoint(date),
        }
    }

    /// Trigger text for the committed range: "Apr 1, 2025 - Apr 10, 2025",
    /// a single date, or the placeholder.
    pub fn display_text(&self) -> String {
        let zone = self.config.timezone.as_str();
        let Some(from) = self
            .committed
            .from
            .and_then(|at| format_in_zone(at, zone, TRIGGER_DATE_FORMAT))
        else {
            return self.config.placeholder.clone();
        };
        match self.committed.to.and_then(|at| format_in_zone(at, zone, TRIGGER_DATE_FORMAT)) {
            Some(to) if to != from => format!("{from} - {to}"),
            _ => from,
        }
    }

    pub fn month_label(&self) -> String {
        self.display_month.label()
    }
}

/// The last `days` days up to and including today in `zone`.
pub fn trailing_days(days: u32, zone: &str, now: DateTime<Utc>) -> DateRange {
    let Some(today) = civil_date(now, zone) else {
        return DateRange::empty();
    };
    let first = today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(today);
    DateRange::new(start_of_day(first, zone), end_of_day(today, zone))
}
