use chrono::{DateTime, Utc};

/// A committed range of instants as exchanged with the caller.
///
/// `to` is only ever set together with `from`, and `from <= to` once a range
/// has gone through [`Selection::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none()
    }

    /// Whether `instant` lies within `[from, to]`, treating a missing `to` as `from`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        match self.from {
            Some(from) => from <= instant && instant <= self.to.unwrap_or(from),
            None => false,
        }
    }
}

/// Provisional two-endpoint selection driven by day clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    Empty,
    AnchorOnly(T),
    Complete { from: T, to: T },
}

impl<T: Copy + Ord> Selection<T> {
    /// Re-seeds a selection from stored endpoints. A `to` without a `from` is dropped.
    pub fn from_endpoints(from: Option<T>, to: Option<T>) -> Self {
        match (from, to) {
            (Some(from), Some(to)) => Selection::Complete { from, to },
            (Some(from), None) => Selection::AnchorOnly(from),
            (None, _) => Selection::Empty,
        }
    }

    pub fn click(self, day: T) -> Self {
        match self {
            Selection::AnchorOnly(from) if day >= from => Selection::Complete { from, to: day },
            // A click on a complete range starts over instead of extending it.
            Selection::Empty | Selection::AnchorOnly(_) | Selection::Complete { .. } => {
                Selection::AnchorOnly(day)
            }
        }
    }

    pub fn from(&self) -> Option<T> {
        match *self {
            Selection::Empty => None,
            Selection::AnchorOnly(from) | Selection::Complete { from, .. } => Some(from),
        }
    }

    pub fn to(&self) -> Option<T> {
        match *self {
            Selection::Complete { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    /// Endpoints ready to commit, swapped if they arrived out of order.
    /// `None` while nothing is selected.
    pub fn finish(&self) -> Option<(T, Option<T>)> {
        match *self {
            Selection::Empty => None,
            Selection::AnchorOnly(from) => Some((from, None)),
            Selection::Complete { from, to } if from > to => Some((to, Some(from))),
            Selection::Complete { from, to } => Some((from, Some(to))),
        }
    }

    pub fn is_endpoint(&self, day: T) -> bool {
        self.from() == Some(day) || self.to() == Some(day)
    }

    /// Strictly between the two endpoints.
    pub fn is_inside(&self, day: T) -> bool {
        match *self {
            Selection::Complete { from, to } => from < day && day < to,
            _ => false,
        }
    }
}
