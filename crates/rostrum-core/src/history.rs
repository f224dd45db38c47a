//! Speaking history read back from the spreadsheet.
//!
//! Each group keeps a sheet of past talks. Column 0 holds the member name and
//! the group's date column holds the talk date as `M/D/YYYY`. A row with a
//! malformed date is reported and skipped, so that member is treated as
//! having no talk on record.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Group, GroupLayout};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("{group} history row {row} ({name}): invalid date {value:?}, expected M/D/YYYY")]
    InvalidDate {
        group: Group,
        row: usize,
        name: String,
        value: String,
    },
}

/// Parse a talk date in strict numeric `M/D/YYYY` form.
///
/// Month and day may have one or two digits, the year must have four, and
/// the result must be a real calendar date.
pub fn parse_speaking_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.trim().split('/');
    let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let numeric = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    };
    if !numeric(month, 1, 2) || !numeric(day, 1, 2) || !numeric(year, 4, 4) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// One group's last-talk dates, keyed by member name.
#[derive(Debug, Clone)]
pub struct History {
    pub group: Group,
    dates: HashMap<String, NaiveDate>,
    /// Rows that could not be used, in sheet order.
    pub issues: Vec<HistoryError>,
}

impl History {
    pub fn new(group: Group) -> Self {
        Self {
            group,
            dates: HashMap::new(),
            issues: Vec::new(),
        }
    }

    /// Build a history from raw sheet rows read from `layout.history_range`.
    pub fn from_rows(group: Group, layout: &GroupLayout, rows: &[Vec<String>]) -> Self {
        let mut history = Self::new(group);
        let first_row = layout.history_first_row();

        for (offset, row) in rows.iter().enumerate() {
            let name = row.first().map(|s| s.trim()).unwrap_or_default();
            if name.is_empty() {
                continue;
            }

            let value = match row.get(layout.date_column).map(|s| s.trim()) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    debug!(group = %group, name = %name, "No talk date recorded");
                    continue;
                }
            };

            match parse_speaking_date(value) {
                Some(date) => history.record(name, date),
                None => {
                    let issue = HistoryError::InvalidDate {
                        group,
                        row: first_row + offset,
                        name: name.to_string(),
                        value: value.to_string(),
                    };
                    warn!(error = %issue, "Skipping history row");
                    history.issues.push(issue);
                }
            }
        }

        debug!(
            group = %group,
            rows = rows.len(),
            speakers = history.len(),
            issues = history.issues.len(),
            "Parsed speaking history"
        );
        history
    }

    /// Record a talk, keeping the most recent date per name.
    pub fn record(&mut self, name: &str, date: NaiveDate) {
        self.dates
            .entry(name.to_string())
            .and_modify(|existing| *existing = (*existing).max(date))
            .or_insert(date);
    }

    pub fn last_spoke(&self, name: &str) -> Option<NaiveDate> {
        self.dates.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> {
        self.dates.iter().map(|(name, date)| (name.as_str(), *date))
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
