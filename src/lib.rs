mod config;
mod consts;
mod convert;
mod prelude;
mod range;
#[cfg(test)]
mod test_utils;
mod types;

pub use config::LimiterConfig;
pub use consts::*;
pub use convert::{
    is_leap_year, julian_day_to_millis, julian_to_persian, month_length, persian_to_julian,
    to_julian_day,
};
pub use jiff::tz::TimeZone;
pub use range::{DateRangeLimiter, LimiterState, RangeError};
pub use types::PersianDate;

use crate::convert::{julian_day_of, to_internal_year, to_visible_year};
use crate::prelude::*;
use crate::types::days_in_month;
use jiff::civil::{Date, Time, Weekday};
use jiff::tz::Offset;
use jiff::{Span, Timestamp, Zoned};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DateError {
    #[display(fmt = "Invalid Persian date: year {year}, month index {month}, day {day}")]
    InvalidDate { year: i32, month: u8, day: u8 },
    #[display(fmt = "Invalid date format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Empty date string")]
    EmptyInput,
    #[display(fmt = "Date outside the supported range: {_0}")]
    OutOfRange(String),
    #[display(fmt = "Unknown time zone: {_0}")]
    UnknownTimeZone(String),
}

impl std::error::Error for DateError {}

impl DateError {
    fn out_of_range(err: &jiff::Error) -> Self {
        Self::OutOfRange(err.to_string())
    }
}

/// Identifies the time zone of a [`CalendarDate`] for comparison and storage.
///
/// Zones with an IANA name are kept by name. Anything else (fixed offsets,
/// POSIX zones from the environment) is reduced to its offset at the date's
/// instant; restoring such a key yields a fixed offset without the zone's
/// daylight saving transitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneKey {
    Named(String),
    Fixed(i32),
}

impl ZoneKey {
    fn of(zone: &TimeZone, at: Timestamp) -> Self {
        zone.iana_name().map_or_else(
            || Self::Fixed(zone.to_offset(at).seconds()),
            |name| Self::Named(name.to_owned()),
        )
    }

    /// Resolves the key back into a time zone.
    ///
    /// # Errors
    /// Returns `DateError::UnknownTimeZone` if the name is not in the time zone
    /// database or the offset is out of bounds.
    pub fn to_time_zone(&self) -> Result<TimeZone, DateError> {
        match self {
            Self::Named(name) if name == "UTC" => Ok(TimeZone::UTC),
            Self::Named(name) => {
                TimeZone::get(name).map_err(|_| DateError::UnknownTimeZone(name.clone()))
            },
            Self::Fixed(seconds) => Offset::from_seconds(*seconds)
                .map(TimeZone::fixed)
                .map_err(|_| DateError::UnknownTimeZone(format!("offset of {seconds} seconds"))),
        }
    }
}

/// An instant in a time zone, together with the Persian date of its local day.
///
/// The Persian fields are computed when the value is built and every
/// operation that changes the instant or zone returns a new value, so they
/// cannot go stale. Equality and ordering follow the instant, with the zone
/// as a tie-break.
#[derive(Debug, Clone, Display, Serialize, Deserialize)]
#[display(fmt = "{persian}")]
#[serde(into = "CalendarDateRepr", try_from = "CalendarDateRepr")]
pub struct CalendarDate {
    instant:    Timestamp,
    zone:       TimeZone,
    zone_key:   ZoneKey,
    persian:    PersianDate,
    julian_day: i64,
}

impl CalendarDate {
    /// Creates a date for `instant` as observed in `zone`.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the local day has no Persian date.
    pub fn from_timestamp(instant: Timestamp, zone: TimeZone) -> Result<Self, DateError> {
        let offset_millis = i64::from(zone.to_offset(instant).seconds()) * 1000;
        let julian_day = instant
            .as_millisecond()
            .checked_add(offset_millis)
            .and_then(to_julian_day)
            .ok_or_else(|| DateError::OutOfRange(format!("{instant} in {zone:?}")))?;
        Ok(Self {
            zone_key: ZoneKey::of(&zone, instant),
            persian: julian_to_persian(julian_day)?,
            instant,
            zone,
            julian_day,
        })
    }

    /// Creates a date from milliseconds since the Unix epoch.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the instant is not representable.
    pub fn from_millis(millis: i64, zone: TimeZone) -> Result<Self, DateError> {
        let instant = Timestamp::from_millisecond(millis).map_err(|e| DateError::out_of_range(&e))?;
        Self::from_timestamp(instant, zone)
    }

    /// Creates the date at the start of the given Persian day in `zone`.
    ///
    /// # Errors
    /// Returns `DateError::InvalidDate` for a triple that is not a real date and
    /// `DateError::OutOfRange` if the day cannot be represented as an instant.
    pub fn from_persian(year: i32, month: u8, day: u8, zone: TimeZone) -> Result<Self, DateError> {
        Self::from_persian_date(PersianDate::new(year, month, day)?, zone)
    }

    /// Creates the date at the start of `date` in `zone`.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the day cannot be represented as an instant.
    pub fn from_persian_date(date: PersianDate, zone: TimeZone) -> Result<Self, DateError> {
        Self::at_local_time(date, Time::midnight(), zone)
    }

    /// Creates the date at the start of the given Gregorian day in `zone`.
    ///
    /// # Errors
    /// Returns `DateError::InvalidFormat` for an impossible Gregorian date and
    /// `DateError::OutOfRange` if the day cannot be represented as an instant.
    pub fn from_gregorian(year: i16, month: i8, day: i8, zone: TimeZone) -> Result<Self, DateError> {
        let date = Date::new(year, month, day).map_err(|e| DateError::InvalidFormat(e.to_string()))?;
        let zoned = date.to_zoned(zone.clone()).map_err(|e| DateError::out_of_range(&e))?;
        Self::from_timestamp(zoned.timestamp(), zone)
    }

    /// The current instant in `zone`.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the local day has no Persian date.
    pub fn now(zone: TimeZone) -> Result<Self, DateError> {
        Self::from_timestamp(Timestamp::now(), zone)
    }

    fn at_local_time(date: PersianDate, time: Time, zone: TimeZone) -> Result<Self, DateError> {
        let unix_day = julian_day_of(date) - UNIX_EPOCH_JULIAN_DAY;
        let civil = Timestamp::from_second(unix_day * SECONDS_OF_A_DAY)
            .map_err(|e| DateError::out_of_range(&e))?
            .to_zoned(TimeZone::UTC)
            .date();
        let zoned = civil
            .to_datetime(time)
            .to_zoned(zone.clone())
            .map_err(|e| DateError::out_of_range(&e))?;
        Self::from_timestamp(zoned.timestamp(), zone)
    }

    fn zoned(&self) -> Zoned {
        self.instant.to_zoned(self.zone.clone())
    }

    /// The first instant of this date's local day.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` at the edges of the supported range.
    pub fn at_midnight(&self) -> Result<Self, DateError> {
        let start = self.zoned().start_of_day().map_err(|e| DateError::out_of_range(&e))?;
        Self::from_timestamp(start.timestamp(), self.zone.clone())
    }

    /// The same instant observed in another zone.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the local day has no Persian date.
    pub fn with_time_zone(&self, zone: TimeZone) -> Result<Self, DateError> {
        Self::from_timestamp(self.instant, zone)
    }

    /// Moves to another Persian date, keeping the local time of day.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the result cannot be represented.
    pub fn with_persian_date(&self, date: PersianDate) -> Result<Self, DateError> {
        Self::at_local_time(date, self.zoned().time(), self.zone.clone())
    }

    /// Adds (or with a negative amount, subtracts) calendar days.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the result cannot be represented.
    pub fn add_days(&self, days: i64) -> Result<Self, DateError> {
        let span = Span::new().try_days(days).map_err(|e| DateError::out_of_range(&e))?;
        let moved = self.zoned().checked_add(span).map_err(|e| DateError::out_of_range(&e))?;
        Self::from_timestamp(moved.timestamp(), self.zone.clone())
    }

    /// Adds Persian months. The day is clamped to the length of the target
    /// month, so Shahrivar 31 plus one month is Mehr 30.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the result cannot be represented.
    pub fn add_months(&self, months: i64) -> Result<Self, DateError> {
        let overflow = || DateError::OutOfRange(format!("{self} plus {months} months"));

        let index = to_internal_year(self.persian.year())
            .checked_mul(i64::from(MONTHS_IN_YEAR))
            .and_then(|i| i.checked_add(i64::from(self.persian.month())))
            .and_then(|i| i.checked_add(months))
            .ok_or_else(overflow)?;
        let internal_year = index.div_euclid(i64::from(MONTHS_IN_YEAR));
        let year = i32::try_from(to_visible_year(internal_year)).map_err(|_| overflow())?;
        let month = u8::try_from(index.rem_euclid(i64::from(MONTHS_IN_YEAR))).map_err(|_| overflow())?;
        let day = self.persian.day().min(days_in_month(year, month));

        self.with_persian_date(PersianDate::new(year, month, day)?)
    }

    /// Adds Persian years, clamping Esfand 30 to Esfand 29 in common years.
    ///
    /// # Errors
    /// Returns `DateError::OutOfRange` if the result cannot be represented.
    pub fn add_years(&self, years: i64) -> Result<Self, DateError> {
        let months = years
            .checked_mul(i64::from(MONTHS_IN_YEAR))
            .ok_or_else(|| DateError::OutOfRange(format!("{self} plus {years} years")))?;
        self.add_months(months)
    }

    /// The Persian date of the local day
    pub const fn persian(&self) -> PersianDate {
        self.persian
    }

    pub const fn persian_year(&self) -> i32 {
        self.persian.year()
    }

    /// 0-based Persian month
    pub const fn persian_month(&self) -> u8 {
        self.persian.month()
    }

    pub const fn persian_day(&self) -> u8 {
        self.persian.day()
    }

    pub const fn is_persian_leap_year(&self) -> bool {
        self.persian.is_leap_year()
    }

    /// Julian day number of the local day
    pub const fn julian_day(&self) -> i64 {
        self.julian_day
    }

    /// Milliseconds since the Unix epoch
    pub fn millis(&self) -> i64 {
        self.instant.as_millisecond()
    }

    pub const fn timestamp(&self) -> Timestamp {
        self.instant
    }

    pub const fn time_zone(&self) -> &TimeZone {
        &self.zone
    }

    pub const fn zone_key(&self) -> &ZoneKey {
        &self.zone_key
    }

    /// The Gregorian date of the local day
    pub fn gregorian(&self) -> Date {
        self.zoned().date()
    }

    pub fn weekday(&self) -> Weekday {
        self.zoned().weekday()
    }

    /// Persian name of the local weekday
    pub fn weekday_name(&self) -> &'static str {
        let index = match self.weekday() {
            Weekday::Saturday => 0,
            Weekday::Sunday => 1,
            Weekday::Monday => 2,
            Weekday::Tuesday => 3,
            Weekday::Wednesday => 4,
            Weekday::Thursday => 5,
            Weekday::Friday => 6,
        };
        WEEKDAY_NAMES[index]
    }

    /// Weekday, day, month name and year, e.g. `شنبه  01  خرداد  1361`.
    pub fn long_date(&self) -> String {
        format!(
            "{}  {:02}  {}  {}",
            self.weekday_name(),
            self.persian.day(),
            self.persian.month_name(),
            self.persian.year()
        )
    }

    /// Formats the Persian date as `YYYY<delimiter>MM<delimiter>DD`.
    pub fn short_date(&self, delimiter: &str) -> String {
        self.persian.format_with(delimiter)
    }
}

impl PartialEq for CalendarDate {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant && self.zone_key == other.zone_key
    }
}

impl Eq for CalendarDate {}

impl PartialOrd for CalendarDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalendarDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.instant.cmp(&other.instant) {
            Ordering::Equal => self.zone_key.cmp(&other.zone_key),
            ord => ord,
        }
    }
}

/// Stored form of a [`CalendarDate`]: the instant and the zone it is observed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalendarDateRepr {
    millis: i64,
    zone:   ZoneKey,
}

impl From<CalendarDate> for CalendarDateRepr {
    fn from(date: CalendarDate) -> Self {
        Self {
            millis: date.millis(),
            zone:   date.zone_key,
        }
    }
}

impl TryFrom<CalendarDateRepr> for CalendarDate {
    type Error = DateError;

    fn try_from(repr: CalendarDateRepr) -> Result<Self, Self::Error> {
        Self::from_millis(repr.millis, repr.zone.to_time_zone()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{gregorian, persian, tehran, utc};

    #[test]
    fn test_from_persian_is_local_midnight() {
        let date = persian(1403, 0, 1, utc());
        assert_eq!(date.persian().to_tuple(), (1403, 0, 1));
        assert_eq!(date.gregorian(), jiff::civil::date(2024, 3, 20));
        assert_eq!(date.millis() % MILLIS_OF_A_DAY, 0);
        assert_eq!(date.julian_day(), 2_460_390);
    }

    #[test]
    fn test_from_gregorian() {
        let date = gregorian(2024, 1, 10, utc());
        assert_eq!(date.persian().to_tuple(), (1402, 9, 20));
        assert_eq!(date.persian_year(), 1402);
        assert_eq!(date.persian_month(), 9);
        assert_eq!(date.persian_day(), 20);

        assert!(CalendarDate::from_gregorian(2023, 2, 29, utc()).is_err());
    }

    #[test]
    fn test_persian_fields_follow_local_day() {
        // 22:00 UTC on the eve of Nowruz is already 1 Farvardin in Tehran.
        let millis = persian(1403, 0, 1, utc()).millis() - 2 * 3_600_000;
        let in_utc = CalendarDate::from_millis(millis, utc()).unwrap();
        let in_tehran = CalendarDate::from_millis(millis, tehran()).unwrap();

        assert_eq!(in_utc.persian().to_tuple(), (1402, 11, 29));
        assert_eq!(in_tehran.persian().to_tuple(), (1403, 0, 1));
        assert_eq!(in_tehran.julian_day(), in_utc.julian_day() + 1);
    }

    #[test]
    fn test_with_time_zone_recomputes_fields() {
        let millis = persian(1403, 0, 1, utc()).millis() - 2 * 3_600_000;
        let date = CalendarDate::from_millis(millis, utc()).unwrap();
        let moved = date.with_time_zone(tehran()).unwrap();

        assert_eq!(moved.millis(), date.millis());
        assert_eq!(moved.persian().to_tuple(), (1403, 0, 1));
        assert_ne!(moved, date);
    }

    #[test]
    fn test_at_midnight() {
        let noon = CalendarDate::from_millis(persian(1402, 9, 20, tehran()).millis() + 12 * 3_600_000, tehran())
            .unwrap();
        let midnight = noon.at_midnight().unwrap();

        assert_eq!(midnight, persian(1402, 9, 20, tehran()));
        assert_eq!(midnight.persian(), noon.persian());
    }

    #[test]
    fn test_add_days_crosses_year_boundary() {
        let last = persian(1402, 11, 29, utc());
        let next = last.add_days(1).unwrap();
        assert_eq!(next.persian().to_tuple(), (1403, 0, 1));

        let back = next.add_days(-1).unwrap();
        assert_eq!(back, last);

        let leap_end = persian(1399, 11, 29, utc()).add_days(1).unwrap();
        assert_eq!(leap_end.persian().to_tuple(), (1399, 11, 30));
    }

    #[test]
    fn test_add_days_keeps_time_of_day() {
        let date = CalendarDate::from_millis(persian(1403, 5, 31, tehran()).millis() + 9 * 3_600_000, tehran())
            .unwrap();
        let moved = date.add_days(3).unwrap();
        assert_eq!(moved.persian().to_tuple(), (1403, 6, 3));
        assert_eq!(moved.millis() - date.millis(), 3 * MILLIS_OF_A_DAY);
    }

    #[test]
    fn test_add_months_cases() {
        struct TestCase {
            start:       (i32, u8, u8),
            months:      i64,
            expected:    (i32, u8, u8),
            description: &'static str,
        }

        let cases = [
            TestCase {
                start:       (1403, 0, 15),
                months:      1,
                expected:    (1403, 1, 15),
                description: "simple month step",
            },
            TestCase {
                start:       (1403, 5, 31),
                months:      1,
                expected:    (1403, 6, 30),
                description: "clamped into a 30-day month",
            },
            TestCase {
                start:       (1402, 10, 10),
                months:      3,
                expected:    (1403, 1, 10),
                description: "wraps into the next year",
            },
            TestCase {
                start:       (1403, 1, 10),
                months:      -3,
                expected:    (1402, 10, 10),
                description: "wraps into the previous year",
            },
            TestCase {
                start:       (1, 1, 10),
                months:      -3,
                expected:    (-1, 10, 10),
                description: "crosses the epoch without a year zero",
            },
        ];

        for case in &cases {
            let (y, m, d) = case.start;
            let moved = persian(y, m, d, utc()).add_months(case.months).unwrap();
            assert_eq!(moved.persian().to_tuple(), case.expected, "{}", case.description);
        }
    }

    #[test]
    fn test_add_years_clamps_leap_day() {
        let leap_day = persian(1399, 11, 30, utc());
        assert_eq!(leap_day.add_years(1).unwrap().persian().to_tuple(), (1400, 11, 29));
        assert_eq!(leap_day.add_years(-4).unwrap().persian().to_tuple(), (1395, 11, 30));
    }

    #[test]
    fn test_before_epoch_date() {
        let date = persian(-1, 11, 30, utc());
        assert_eq!(date.julian_day(), PERSIAN_EPOCH - 1);
        assert_eq!(date.add_days(1).unwrap().persian().to_tuple(), (1, 0, 1));
    }

    #[test]
    fn test_equality_and_ordering() {
        let a = persian(1402, 9, 20, utc());
        let b = persian(1402, 9, 22, utc());
        assert!(a < b);
        assert_eq!(a, a.clone());
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);

        // Same instant, different zone: not equal, ordered by zone key.
        let moved = a.with_time_zone(tehran()).unwrap();
        assert_ne!(a, moved);
        assert_ne!(a.cmp(&moved), Ordering::Equal);
    }

    #[test]
    fn test_display_and_short_date() {
        let date = persian(1361, 2, 1, utc());
        assert_eq!(date.to_string(), "1361/03/01");
        assert_eq!(date.short_date("-"), "1361-03-01");
    }

    #[test]
    fn test_leap_year_flag() {
        assert!(persian(1399, 0, 1, utc()).is_persian_leap_year());
        assert!(!persian(1400, 0, 1, utc()).is_persian_leap_year());
    }

    #[test]
    fn test_weekday() {
        // 1 Farvardin 1403 was a Wednesday.
        assert_eq!(persian(1403, 0, 1, utc()).weekday(), Weekday::Wednesday);
    }

    #[test]
    fn test_weekday_names_start_on_saturday() {
        struct TestCase {
            date:        CalendarDate,
            expected:    &'static str,
            description: &'static str,
        }

        let cases = [
            TestCase {
                date:        persian(1361, 2, 1, utc()),
                expected:    WEEKDAY_NAMES[0],
                description: "Saturday",
            },
            TestCase {
                date:        persian(1361, 2, 2, utc()),
                expected:    WEEKDAY_NAMES[1],
                description: "Sunday",
            },
            TestCase {
                date:        persian(1403, 0, 1, utc()),
                expected:    "چهارشنبه",
                description: "Wednesday",
            },
            TestCase {
                date:        persian(1361, 2, 7, utc()),
                expected:    "جمعه",
                description: "Friday",
            },
        ];

        for case in &cases {
            assert_eq!(case.date.weekday_name(), case.expected, "Weekday name for {}", case.description);
        }
    }

    #[test]
    fn test_weekday_name_follows_local_day() {
        // 23:00 UTC on Friday is already Saturday in Tehran.
        let millis = persian(1361, 2, 1, utc()).millis() - 3_600_000;
        let date = CalendarDate::from_millis(millis, utc()).unwrap();
        assert_eq!(date.weekday_name(), "جمعه");
        assert_eq!(date.with_time_zone(tehran()).unwrap().weekday_name(), "شنبه");
    }

    #[test]
    fn test_long_date() {
        assert_eq!(persian(1361, 2, 1, utc()).long_date(), "شنبه  01  خرداد  1361");
        // Esfand 30 of a leap year
        assert_eq!(persian(1399, 11, 30, tehran()).long_date(), "شنبه  30  اسفند  1399");
    }

    #[test]
    fn test_serde_round_trip_fixed_zone() {
        let date = persian(1403, 6, 12, tehran());
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(
            json,
            format!(r#"{{"millis":{},"zone":{{"Fixed":12600}}}}"#, date.millis())
        );

        let parsed: CalendarDate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, date);
        assert_eq!(parsed.persian(), date.persian());
    }

    #[test]
    fn test_serde_round_trip_utc() {
        let date = persian(1403, 6, 12, utc());
        let json = serde_json::to_string(&date).unwrap();
        let parsed: CalendarDate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, date);
    }

    #[test]
    fn test_serde_rejects_bad_zone() {
        let json = r#"{"millis":0,"zone":{"Fixed":999999}}"#;
        let result: Result<CalendarDate, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_millis_out_of_range() {
        assert!(matches!(
            CalendarDate::from_millis(i64::MAX, utc()),
            Err(DateError::OutOfRange(_))
        ));
    }
}
