use crate::DateError;
use crate::consts::{DATE_SEPARATOR, DAYS_IN_MONTH, ESFAND, ESFAND_DAYS_LEAP, MIN_DAY, MONTH_NAMES};
use crate::convert::is_leap_year;
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A Persian calendar date: year, 0-based month and 1-based day.
///
/// Always a real date: year 0 does not exist, the month is in `0..=11` and
/// the day is within the length of that month. Ordered chronologically.
/// The text form is `YYYY/MM/DD` with a 1-based month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{:04}/{:02}/{:02}", year, "month + 1", day)]
pub struct PersianDate {
    year:  i32,
    month: u8,
    day:   u8,
}

impl PersianDate {
    /// Creates a new date, validating every component.
    ///
    /// # Errors
    /// Returns `DateError::InvalidDate` if the year is 0, the month is
    /// outside `0..=11` or the day does not exist in that month.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, DateError> {
        if year == 0 || month > ESFAND || day < MIN_DAY || day > days_in_month(year, month) {
            return Err(DateError::InvalidDate { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    /// Builds a date from components the conversion arithmetic guarantees valid.
    pub(crate) const fn from_parts_unchecked(year: i32, month: u8, day: u8) -> Self {
        debug_assert!(year != 0 && month <= ESFAND && day >= MIN_DAY);
        Self { year, month, day }
    }

    /// First day of the given year.
    ///
    /// # Errors
    /// Returns `DateError::InvalidDate` for year 0.
    pub fn first_of_year(year: i32) -> Result<Self, DateError> {
        Self::new(year, 0, MIN_DAY)
    }

    /// Last day of the given year (Esfand 29, or 30 in leap years).
    ///
    /// # Errors
    /// Returns `DateError::InvalidDate` for year 0.
    pub fn last_of_year(year: i32) -> Result<Self, DateError> {
        Self::new(year, ESFAND, days_in_month(year, ESFAND))
    }

    /// Returns the year
    #[inline]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Returns the 0-based month
    #[inline]
    pub const fn month(self) -> u8 {
        self.month
    }

    /// Returns the 1-based day of month
    #[inline]
    pub const fn day(self) -> u8 {
        self.day
    }

    /// Persian name of the month
    pub const fn month_name(self) -> &'static str {
        MONTH_NAMES[self.month as usize]
    }

    /// Returns `(year, month, day)`
    pub const fn to_tuple(self) -> (i32, u8, u8) {
        (self.year, self.month, self.day)
    }

    /// Whether this date falls in a leap year
    pub const fn is_leap_year(self) -> bool {
        is_leap_year(self.year)
    }

    /// Formats as `YYYY<delimiter>MM<delimiter>DD` with a 1-based month.
    pub fn format_with(self, delimiter: &str) -> String {
        format!(
            "{:04}{delimiter}{:02}{delimiter}{:02}",
            self.year,
            self.month + 1,
            self.day
        )
    }

    fn parse_component<T: FromStr>(s: &str) -> Result<T, DateError> {
        s.trim()
            .parse::<T>()
            .map_err(|_| DateError::InvalidFormat(s.to_owned()))
    }
}

impl TryFrom<(i32, u8, u8)> for PersianDate {
    type Error = DateError;

    fn try_from((year, month, day): (i32, u8, u8)) -> Result<Self, Self::Error> {
        Self::new(year, month, day)
    }
}

impl From<PersianDate> for (i32, u8, u8) {
    fn from(date: PersianDate) -> Self {
        date.to_tuple()
    }
}

impl FromStr for PersianDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DateError::EmptyInput);
        }

        let parts: Vec<&str> = trimmed.split(DATE_SEPARATOR).collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(DateError::InvalidFormat(format!(
                "Expected YYYY{DATE_SEPARATOR}MM{DATE_SEPARATOR}DD, found {} component(s): {s}",
                parts.len()
            )));
        };

        let year: i32 = Self::parse_component(year)?;
        let month: u8 = Self::parse_component(month)?;
        let day: u8 = Self::parse_component(day)?;

        // The text form is 1-based; month 0 cannot be shifted down.
        let Some(month_index) = month.checked_sub(1) else {
            return Err(DateError::InvalidDate { year, month, day });
        };
        Self::new(year, month_index, day)
    }
}

impl Serialize for PersianDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PersianDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// Helper functions

/// Number of days in the 0-based `month` of `year`. The month must already
/// be validated; [`month_length`](crate::month_length) is the checked form.
pub(crate) const fn days_in_month(year: i32, month: u8) -> u8 {
    debug_assert!(month <= ESFAND);

    if month == ESFAND && is_leap_year(year) {
        ESFAND_DAYS_LEAP
    } else {
        DAYS_IN_MONTH[month as usize]
    }
}
