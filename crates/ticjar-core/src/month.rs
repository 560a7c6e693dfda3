//! Calendar month keys, the bucketing unit for tic counts

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local};
use thiserror::Error;

/// A calendar month in `YYYY-MM` form.
///
/// Ordering compares the parsed year and month, so range filters work on
/// real dates rather than string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

/// A month bound that failed to parse as `YYYY-MM`
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid date format. Please use YYYY-MM.")]
pub struct ParseMonthError;

impl MonthKey {
    /// Returns `None` if `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing the local wall-clock "now"
    pub fn current() -> Self {
        let now = Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    /// The preceding calendar month, rolling the year back over January
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for MonthKey {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s.split_once('-').ok_or(ParseMonthError)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(ParseMonthError);
        }
        let year: i32 = year.parse().map_err(|_| ParseMonthError)?;
        let month: u32 = month.parse().map_err(|_| ParseMonthError)?;
        Self::new(year, month).ok_or(ParseMonthError)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
