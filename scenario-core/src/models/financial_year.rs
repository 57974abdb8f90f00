use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Accepts `FY2024-25`, `FY2024-2025`, `FY24-25`, `2024-25` and `2024-2025`.
static FY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?i:fy)(?P<short>\d{2})|(?:(?i:fy))?(?P<long>\d{4}))-(?P<end>\d{2}|\d{4})$")
        .expect("financial year pattern is valid")
});

/// Errors produced when parsing a financial year label.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinancialYearError {
    #[error("invalid financial year format '{0}' - expected format: FY2024-25")]
    InvalidFormat(String),

    #[error("financial year must span consecutive years, got '{0}'")]
    NotConsecutive(String),

    #[error("financial year {0} is out of range")]
    OutOfRange(i32),
}

/// An Australian income year, running 1 July to 30 June.
///
/// Identified by the calendar year in which it starts: `FY2024-25` has a
/// `start_year` of 2024 and ends on 30 June 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FinancialYear {
    start_year: i32,
}

impl FinancialYear {
    pub const MIN_START_YEAR: i32 = 1900;
    pub const MAX_START_YEAR: i32 = 2999;

    pub fn new(start_year: i32) -> Result<Self, FinancialYearError> {
        if !(Self::MIN_START_YEAR..=Self::MAX_START_YEAR).contains(&start_year) {
            return Err(FinancialYearError::OutOfRange(start_year));
        }
        Ok(Self { start_year })
    }

    pub(crate) const fn new_unchecked(start_year: i32) -> Self {
        Self { start_year }
    }

    /// The financial year a calendar date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        let start_year = if date.month() >= 7 {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// The calendar year holding 30 June, i.e. the legislative cutoff.
    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    /// 1 July of the start year.
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, 7, 1)
    }

    /// 30 June of the end year.
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.end_year(), 6, 30)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::containing(date) == *self
    }

    pub fn label(&self) -> String {
        format!("FY{}-{:02}", self.start_year, self.end_year() % 100)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for FinancialYear {
    type Err = FinancialYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = FY_LABEL
            .captures(trimmed)
            .ok_or_else(|| FinancialYearError::InvalidFormat(trimmed.to_string()))?;

        let start_year = match (caps.name("short"), caps.name("long")) {
            (Some(short), _) => 2000 + parse_digits(short.as_str(), trimmed)?,
            (None, Some(long)) => parse_digits(long.as_str(), trimmed)?,
            (None, None) => return Err(FinancialYearError::InvalidFormat(trimmed.to_string())),
        };

        let end = caps
            .name("end")
            .map(|m| m.as_str())
            .ok_or_else(|| FinancialYearError::InvalidFormat(trimmed.to_string()))?;
        let end_value = parse_digits(end, trimmed)?;
        let consecutive = if end.len() == 2 {
            end_value == (start_year + 1) % 100
        } else {
            end_value == start_year + 1
        };
        if !consecutive {
            return Err(FinancialYearError::NotConsecutive(trimmed.to_string()));
        }

        Self::new(start_year)
    }
}

fn parse_digits(
    digits: &str,
    label: &str,
) -> Result<i32, FinancialYearError> {
    digits
        .parse()
        .map_err(|_| FinancialYearError::InvalidFormat(label.to_string()))
}

impl Serialize for FinancialYear {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for FinancialYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}
