//! Date-range selection: calendar grids, a two-click selection state
//! machine, timezone-aware day boundaries and the picker that ties them
//! together.

pub mod clock;
pub mod eligibility;
pub mod error;
pub mod month;
pub mod picker;
pub mod selection;
pub mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use eligibility::{PastDateFilter, UNLIMITED_PAST_DAYS};
pub use error::{Error, Result};
pub use month::{generate, CalendarDay, DisplayMonth, WEEKDAY_LABELS};
pub use picker::{trailing_days, DateRangePicker, DayState, PickerConfig};
pub use selection::{DateRange, Selection};
