//! Shared builders for unit tests.

use crate::{CalendarDate, TimeZone};
use jiff::tz::Offset;

pub fn utc() -> TimeZone {
    TimeZone::UTC
}

/// Fixed +03:30, Iran Standard Time
pub fn tehran() -> TimeZone {
    TimeZone::fixed(Offset::from_seconds(12_600).expect("+03:30 is a valid offset"))
}

pub fn persian(year: i32, month: u8, day: u8, zone: TimeZone) -> CalendarDate {
    CalendarDate::from_persian(year, month, day, zone)
        .unwrap_or_else(|e| panic!("failed to build Persian date {year}/{month}/{day}: {e}"))
}

pub fn gregorian(year: i16, month: i8, day: i8, zone: TimeZone) -> CalendarDate {
    CalendarDate::from_gregorian(year, month, day, zone)
        .unwrap_or_else(|e| panic!("failed to build Gregorian date {year}-{month}-{day}: {e}"))
}
