use chrono::{Datelike, Days, Months, NaiveDate};

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const FIVE_WEEKS: usize = 35;
const SIX_WEEKS: usize = 42;

/// The month whose grid is currently shown. Always anchored on day 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayMonth {
    first: NaiveDate,
}

impl DisplayMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - Days::new(u64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        self.first
            .iter_days()
            .take_while(|d| d.month() == self.first.month())
            .count() as u32
    }

    pub fn next_month(self) -> Self {
        self.shift(1)
    }

    pub fn prev_month(self) -> Self {
        self.shift(-1)
    }

    /// Moves by `delta` civil months, wrapping across years. Stays put if the
    /// result would leave chrono's representable range.
    pub fn shift(self, delta: i32) -> Self {
        let months = Months::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.first.checked_add_months(months)
        } else {
            self.first.checked_sub_months(months)
        };
        moved.map(|first| Self { first }).unwrap_or(self)
    }

    /// "April 2025"
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub day_of_month: u32,
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_disabled: bool,
}

/// Builds the grid for `month`: trailing days of the previous month up to
/// the first weekday (Sunday first), the month itself, then leading days of
/// the next month until the grid holds 35 cells, or 42 when 35 are not
/// enough.
pub fn generate<F>(month: DisplayMonth, is_ineligible: F) -> Vec<CalendarDay>
where
    F: Fn(NaiveDate) -> bool,
{
    let first = month.first_day();
    let leading = u64::from(first.weekday().num_days_from_sunday());
    let mut days = Vec::with_capacity(SIX_WEEKS);
    let mut push = |date: NaiveDate, is_current_month: bool| {
        days.push(CalendarDay {
            day_of_month: date.day(),
            date,
            is_current_month,
            is_disabled: is_ineligible(date),
        });
    };

    for back in (1..=leading).rev() {
        if let Some(date) = first.checked_sub_days(Days::new(back)) {
            push(date, false);
        }
    }
    let mut last = first;
    for date in first.iter_days().take(month.days_in_month() as usize) {
        push(date, true);
        last = date;
    }

    let filled = leading as usize + month.days_in_month() as usize;
    let target = if filled > FIVE_WEEKS { SIX_WEEKS } else { FIVE_WEEKS };
    for date in last.iter_days().skip(1).take(target - filled) {
        push(date, false);
    }
    days
}
