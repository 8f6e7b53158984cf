//! Demo user directory and the in-memory "fetch by registration date" lookup.

use chrono::NaiveDate;
use range_core::zone::{end_of_day_utc, start_of_day_utc};
use range_core::DateRange;
use tracing::{debug, warn};

use crate::{Column, Row};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub title: String,
    pub email: String,
    pub role: String,
    pub registration_date: NaiveDate,
}

impl User {
    pub fn new(name: &str, title: &str, email: &str, role: &str, registration_date: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            registration_date,
        }
    }

    pub fn to_row(&self) -> Row {
        Row::new()
            .with("name", self.name.as_str())
            .with("title", self.title.as_str())
            .with("email", self.email.as_str())
            .with("role", self.role.as_str())
            .with("registrationDate", self.registration_date.format(DATE_FORMAT).to_string())
    }
}

const SAMPLE_USERS: [(&str, &str, &str, &str, &str); 6] = [
    ("Lindsay Walton", "Front-end Developer", "lindsay.walton@example.com", "Member", "2025-03-15"),
    ("Courtney Henry", "Designer", "courtney.henry@example.com", "Admin", "2025-01-20"),
    ("Tom Cook", "Director of Product", "tom.cook@example.com", "Member", "2025-01-05"),
    ("Whitney Francis", "Copywriter", "whitney.francis@example.com", "Admin", "2025-04-10"),
    ("Leonard Krasner", "Senior Designer", "leonard.krasner@example.com", "Owner", "2025-04-12"),
    ("Floyd Miles", "Principal Designer", "floyd.miles@example.com", "Member", "2024-08-12"),
];

pub fn sample_users() -> Vec<User> {
    SAMPLE_USERS
        .iter()
        .filter_map(|&(name, title, email, role, registered)| {
            match NaiveDate::parse_from_str(registered, DATE_FORMAT) {
                Ok(date) => Some(User::new(name, title, email, role, date)),
                Err(err) => {
                    warn!(name, registered, %err, "skipping sample user");
                    None
                }
            }
        })
        .collect()
}

/// Users registered within the range, treating each registration date as
/// midnight UTC. The range is widened to whole days of `zone`; a missing
/// `to` means the single day of `from`, a missing `from` matches nothing.
pub fn fetch_users_by_range(users: &[User], range: &DateRange, zone: &str) -> Vec<User> {
    if range.from.is_none() {
        return Vec::new();
    }
    let (Some(from), Some(to)) = (
        start_of_day_utc(range.from, zone),
        end_of_day_utc(range.to.or(range.from), zone),
    ) else {
        warn!(zone, "cannot resolve range bounds, returning no users");
        return Vec::new();
    };

    let matched: Vec<User> = users
        .iter()
        .filter(|user| {
            let registered = user.registration_date.and_time(Default::default()).and_utc();
            from <= registered && registered <= to
        })
        .cloned()
        .collect();
    debug!(%from, %to, count = matched.len(), "users fetched");
    matched
}

fn registration_cell(row: &Row) -> String {
    let raw = row.get("registrationDate").to_string();
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or(raw)
}

pub fn user_columns() -> Vec<Column> {
    vec![
        Column::new("name", "Full Name").sortable(),
        Column::new("title", "Title").sortable(),
        Column::new("email", "Email Address"),
        Column::new("role", "Role"),
        Column::new("registrationDate", "Registered On").with_cell(registration_cell),
    ]
}

pub fn user_rows(users: &[User]) -> Vec<Row> {
    users.iter().map(User::to_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataTable, SortDirection};
    use chrono::{DateTime, Utc};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn test_sample_users_parse() {
        assert_eq!(sample_users().len(), 6);
    }

    #[test]
    fn test_fetch_within_calcutta_days() {
        let range = DateRange::new(
            Some(utc("2025-03-31T18:30:00Z")),
            Some(utc("2025-04-10T18:29:59.999Z")),
        );
        let users = fetch_users_by_range(&sample_users(), &range, "Asia/Calcutta");
        assert_eq!(names(&users), vec!["Whitney Francis"]);
    }

    #[test]
    fn test_fetch_single_day() {
        let range = DateRange::new(Some(utc("2025-01-19T18:30:00Z")), None);
        let users = fetch_users_by_range(&sample_users(), &range, "Asia/Calcutta");
        assert_eq!(names(&users), vec!["Courtney Henry"]);
    }

    #[test]
    fn test_fetch_without_from_is_empty() {
        let range = DateRange::new(None, Some(utc("2025-04-10T00:00:00Z")));
        assert!(fetch_users_by_range(&sample_users(), &range, "UTC").is_empty());
    }

    #[test]
    fn test_fetch_with_unknown_zone_is_empty() {
        let range = DateRange::new(Some(utc("2024-01-01T00:00:00Z")), Some(utc("2026-01-01T00:00:00Z")));
        assert!(fetch_users_by_range(&sample_users(), &range, "Nowhere").is_empty());
    }

    #[test]
    fn test_user_table_sorted_by_name() {
        let table = DataTable::new(user_columns(), user_rows(&sample_users()))
            .with_initial_sort(Some("name"), SortDirection::Ascending);
        let first = table.visible_rows()[0];
        assert_eq!(first.get("name").to_string(), "Courtney Henry");
        let registered = &table.columns()[4];
        assert_eq!(table.cell_text(first, registered), "Jan 20, 2025");
    }
}
