//! Conversion between instants, Julian day numbers and the Persian calendar.
//!
//! The arithmetic follows the 2820-year grand cycle rule. Internally years are
//! numbered astronomically (year 0 precedes year 1); the public functions take
//! and return caller-visible years, which skip 0: year -1 is the year before 1.

use crate::consts::{
    CYCLE_BASE_YEAR, ESFAND, FIRST_HALF_DAYS, GRAND_CYCLE_DAYS, GRAND_CYCLE_YEARS,
    MILLIS_JULIAN_EPOCH, MILLIS_OF_A_DAY, PERSIAN_EPOCH,
};
use crate::types::{PersianDate, days_in_month};
use crate::DateError;

/// Julian day number containing the given milliseconds, or `None` if the
/// shift to the Julian epoch overflows.
///
/// The milliseconds are taken as wall-clock time: pass UTC milliseconds for
/// the UTC day, or milliseconds shifted by a zone offset for the local day.
pub const fn to_julian_day(millis: i64) -> Option<i64> {
    match millis.checked_sub(MILLIS_JULIAN_EPOCH) {
        Some(since_epoch) => Some(since_epoch.div_euclid(MILLIS_OF_A_DAY)),
        None => None,
    }
}

/// Milliseconds at 00:00 UTC of the given Julian day number, or `None` if
/// they do not fit in an `i64`.
pub const fn julian_day_to_millis(julian_day: i64) -> Option<i64> {
    match julian_day.checked_mul(MILLIS_OF_A_DAY) {
        Some(millis) => MILLIS_JULIAN_EPOCH.checked_add(millis),
        None => None,
    }
}

/// First Julian day whose Persian year fits in an `i32`.
const MIN_JULIAN_DAY: i64 = internal_to_julian(to_internal_year(i32::MIN), 0, 1);
/// Last Julian day whose Persian year fits in an `i32`.
const MAX_JULIAN_DAY: i64 = internal_to_julian(to_internal_year(i32::MAX) + 1, 0, 1) - 1;

/// Converts a Julian day number into a Persian date.
///
/// # Errors
/// Returns `DateError::OutOfRange` if the Persian year does not fit in an `i32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn julian_to_persian(julian_day: i64) -> Result<PersianDate, DateError> {
    if !(MIN_JULIAN_DAY..=MAX_JULIAN_DAY).contains(&julian_day) {
        return Err(DateError::OutOfRange(format!("Julian day {julian_day}")));
    }

    let since_base = julian_day - internal_to_julian(CYCLE_BASE_YEAR + 1, 0, 1);
    let cycle = since_base.div_euclid(GRAND_CYCLE_DAYS);
    let day_in_cycle = since_base.rem_euclid(GRAND_CYCLE_DAYS);
    let year_in_cycle = if day_in_cycle == GRAND_CYCLE_DAYS - 1 {
        GRAND_CYCLE_YEARS
    } else {
        (2816 * day_in_cycle + 1_031_337).div_euclid(1_028_522)
    };
    let year = CYCLE_BASE_YEAR + GRAND_CYCLE_YEARS * cycle + year_in_cycle;

    let day_of_year = 1 + julian_day - internal_to_julian(year, 0, 1);
    let month = if day_of_year > FIRST_HALF_DAYS {
        ceil_div(day_of_year - 6, 30) - 1
    } else {
        ceil_div(day_of_year, 31) - 1
    };
    let day = julian_day - (internal_to_julian(year, month, 1) - 1);

    let visible_year = i32::try_from(to_visible_year(year))
        .map_err(|_| DateError::OutOfRange(format!("Julian day {julian_day}")))?;
    // month is 0..=11 and day 1..=31 by construction
    Ok(PersianDate::from_parts_unchecked(visible_year, month as u8, day as u8))
}

/// Converts a Persian date into its Julian day number.
///
/// # Errors
/// Returns `DateError::InvalidDate` if the year is 0, the month is outside
/// `0..=11`, or the day does not exist in that month.
pub fn persian_to_julian(year: i32, month: u8, day: u8) -> Result<i64, DateError> {
    let date = PersianDate::new(year, month, day)?;
    Ok(julian_day_of(date))
}

/// Julian day number of an already validated date.
pub(crate) fn julian_day_of(date: PersianDate) -> i64 {
    internal_to_julian(
        to_internal_year(date.year()),
        i64::from(date.month()),
        i64::from(date.day()),
    )
}

/// Determines whether `year` is a leap year (Esfand has 30 days).
/// There is no year 0, so it is never a leap year.
pub const fn is_leap_year(year: i32) -> bool {
    if year == 0 {
        return false;
    }
    let cycle_year = cycle_year(to_internal_year(year));
    ((cycle_year + 38) * 682).rem_euclid(2816) < 682
}

/// Number of days in `month` of `year`, or 0 for a month outside `0..=11`.
pub const fn month_length(year: i32, month: u8) -> u8 {
    if month > ESFAND {
        return 0;
    }
    days_in_month(year, month)
}

const fn internal_to_julian(year: i64, month: i64, day: i64) -> i64 {
    let since_base = year - CYCLE_BASE_YEAR;
    let cycle_year = cycle_year(year);
    let month_days = if month < 7 {
        31 * month
    } else {
        30 * month + 6
    };
    day + month_days
        + (cycle_year * 682 - 110).div_euclid(2816)
        + (cycle_year - 1) * 365
        + since_base.div_euclid(GRAND_CYCLE_YEARS) * GRAND_CYCLE_DAYS
        + (PERSIAN_EPOCH - 1)
}

const fn cycle_year(year: i64) -> i64 {
    (year - CYCLE_BASE_YEAR).rem_euclid(GRAND_CYCLE_YEARS) + CYCLE_BASE_YEAR
}

const fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1).div_euclid(divisor)
}

/// Maps a caller-visible year (no year 0) onto the astronomical numbering.
pub(crate) const fn to_internal_year(year: i32) -> i64 {
    if year > 0 {
        year as i64
    } else {
        year as i64 + 1
    }
}

/// Maps an astronomical year back onto caller-visible numbering.
pub(crate) const fn to_visible_year(year: i64) -> i64 {
    if year > 0 { year } else { year - 1 }
}
