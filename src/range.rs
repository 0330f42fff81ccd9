use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{CalendarDate, DEFAULT_END_YEAR, DEFAULT_START_YEAR, DateError, PersianDate, TimeZone, ZoneKey};

/// Days keyed by the Julian day number of their local day.
type DaySet = BTreeMap<i64, CalendarDate>;

/// Decides which days a date picker may offer and where to move a date that
/// is not allowed.
///
/// Bounds come from a year span (default 1300 to 1500), optional minimum and
/// maximum dates, an optional set of selectable days and a set of disabled
/// days. A non-empty selectable set replaces every other bound; disabled days
/// always win. All stored dates are normalized to the start of their day.
///
/// Setters take `&mut self`; share a limiter across threads only behind a
/// lock of the caller's choosing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "LimiterState", try_from = "LimiterState")]
pub struct DateRangeLimiter {
    min_year:        i32,
    max_year:        i32,
    min_date:        Option<CalendarDate>,
    max_date:        Option<CalendarDate>,
    selectable_days: DaySet,
    disabled_days:   DaySet,
    time_zone:       TimeZone,
}

/// Error type for limiter configuration and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Configured maximum is smaller than the configured minimum year.
    #[error("Invalid year range: end ({end}) must be larger than or equal to start ({start})")]
    InvalidRange { start: i32, end: i32 },

    /// Configured maximum date is before the configured minimum date.
    #[error("Invalid date range: maximum ({end}) is before minimum ({start})")]
    InvalidDateRange { start: PersianDate, end: PersianDate },

    /// Error building or converting a date.
    #[error(transparent)]
    Date(#[from] DateError),

    /// Stored limiter state could not be written or read back.
    #[error("Invalid limiter state: {0}")]
    Persist(String),

    /// Limiter configuration could not be parsed.
    #[error("Invalid limiter configuration: {0}")]
    Config(String),
}

impl Default for DateRangeLimiter {
    fn default() -> Self {
        Self {
            min_year:        DEFAULT_START_YEAR,
            max_year:        DEFAULT_END_YEAR,
            min_date:        None,
            max_date:        None,
            selectable_days: DaySet::new(),
            disabled_days:   DaySet::new(),
            time_zone:       TimeZone::system(),
        }
    }
}

impl DateRangeLimiter {
    /// Creates a limiter spanning the default years in the system time zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `zone` for dates the limiter builds itself.
    #[must_use]
    pub fn with_time_zone(mut self, zone: TimeZone) -> Self {
        self.time_zone = zone;
        self
    }

    /// Sets the zone used for synthesized dates and for
    /// [`is_out_of_range`](Self::is_out_of_range).
    pub fn set_time_zone(&mut self, zone: TimeZone) {
        debug!(zone = ?zone.iana_name(), "limiter time zone set");
        self.time_zone = zone;
    }

    pub const fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    /// Sets the span of selectable years (inclusive).
    ///
    /// # Errors
    /// Returns `RangeError::InvalidRange` if `end_year < start_year`, or if the
    /// new span conflicts with the configured minimum or maximum date.
    pub fn set_year_range(&mut self, start_year: i32, end_year: i32) -> Result<(), RangeError> {
        if end_year < start_year {
            return Err(RangeError::InvalidRange {
                start: start_year,
                end:   end_year,
            });
        }
        self.apply(|limiter| {
            limiter.min_year = start_year;
            limiter.max_year = end_year;
        })?;
        debug!(start_year, end_year, "year range set");
        Ok(())
    }

    /// Sets the earliest selectable day.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidDateRange` or `RangeError::InvalidRange` if
    /// the date lies after the configured maximum.
    pub fn set_min_date(&mut self, date: &CalendarDate) -> Result<(), RangeError> {
        let day = date.at_midnight()?;
        self.apply(|limiter| limiter.min_date = Some(day))?;
        debug!(min_date = ?self.min_date.as_ref().map(CalendarDate::persian), "minimum date set");
        Ok(())
    }

    /// Sets the latest selectable day.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidDateRange` or `RangeError::InvalidRange` if
    /// the date lies before the configured minimum.
    pub fn set_max_date(&mut self, date: &CalendarDate) -> Result<(), RangeError> {
        let day = date.at_midnight()?;
        self.apply(|limiter| limiter.max_date = Some(day))?;
        debug!(max_date = ?self.max_date.as_ref().map(CalendarDate::persian), "maximum date set");
        Ok(())
    }

    /// Replaces the selectable days. Several dates on the same day collapse
    /// into one entry.
    ///
    /// # Errors
    /// Returns `RangeError::Date` if a date cannot be normalized.
    pub fn set_selectable_days(&mut self, days: &[CalendarDate]) -> Result<(), RangeError> {
        self.selectable_days = Self::day_set(days)?;
        debug!(count = self.selectable_days.len(), "selectable days set");
        Ok(())
    }

    /// Replaces the disabled days.
    ///
    /// # Errors
    /// Returns `RangeError::Date` if a date cannot be normalized.
    pub fn set_disabled_days(&mut self, days: &[CalendarDate]) -> Result<(), RangeError> {
        self.disabled_days = Self::day_set(days)?;
        debug!(count = self.disabled_days.len(), "disabled days set");
        Ok(())
    }

    fn day_set(days: &[CalendarDate]) -> Result<DaySet, DateError> {
        days.iter()
            .map(|date| date.at_midnight().map(|day| (day.julian_day(), day)))
            .collect()
    }

    /// Applies a configuration change only if the result stays consistent.
    fn apply(&mut self, change: impl FnOnce(&mut Self)) -> Result<(), RangeError> {
        let mut next = self.clone();
        change(&mut next);
        next.check_bounds()?;
        *self = next;
        Ok(())
    }

    fn check_bounds(&self) -> Result<(), RangeError> {
        if self.max_year < self.min_year {
            return Err(RangeError::InvalidRange {
                start: self.min_year,
                end:   self.max_year,
            });
        }
        if let (Some(min), Some(max)) = (&self.min_date, &self.max_date) {
            if max.julian_day() < min.julian_day() {
                return Err(RangeError::InvalidDateRange {
                    start: min.persian(),
                    end:   max.persian(),
                });
            }
        }
        let (min_year, max_year) = (self.min_year(), self.max_year());
        if max_year < min_year {
            return Err(RangeError::InvalidRange {
                start: min_year,
                end:   max_year,
            });
        }
        Ok(())
    }

    /// Returns the minimum date, if one is set
    pub fn min_date(&self) -> Option<CalendarDate> {
        self.min_date.clone()
    }

    /// Returns the maximum date, if one is set
    pub fn max_date(&self) -> Option<CalendarDate> {
        self.max_date.clone()
    }

    /// Returns the selectable days in ascending order, or `None` if unset.
    pub fn selectable_days(&self) -> Option<Vec<CalendarDate>> {
        (!self.selectable_days.is_empty()).then(|| self.selectable_days.values().cloned().collect())
    }

    /// Returns the disabled days in ascending order, or `None` if unset.
    pub fn disabled_days(&self) -> Option<Vec<CalendarDate>> {
        (!self.disabled_days.is_empty()).then(|| self.disabled_days.values().cloned().collect())
    }

    /// First year a date may be picked in. A minimum date can only narrow the
    /// configured year span.
    pub fn min_year(&self) -> i32 {
        if let Some(first) = self.selectable_days.values().next() {
            return first.persian_year();
        }
        match &self.min_date {
            Some(min) if min.persian_year() > self.min_year => min.persian_year(),
            _ => self.min_year,
        }
    }

    /// Last year a date may be picked in. A maximum date can only narrow the
    /// configured year span.
    pub fn max_year(&self) -> i32 {
        if let Some(last) = self.selectable_days.values().next_back() {
            return last.persian_year();
        }
        match &self.max_date {
            Some(max) if max.persian_year() < self.max_year => max.persian_year(),
            _ => self.max_year,
        }
    }

    /// Earliest date of the range: the first selectable day, else the minimum
    /// date, else 1 Farvardin of the first year.
    ///
    /// # Errors
    /// Returns `RangeError::Date` if the first year has no representable start.
    pub fn start_date(&self) -> Result<CalendarDate, RangeError> {
        if let Some(first) = self.selectable_days.values().next() {
            return Ok(first.clone());
        }
        if let Some(min) = &self.min_date {
            return Ok(min.clone());
        }
        self.first_of_year(self.min_year)
    }

    /// Latest date of the range: the last selectable day, else the maximum
    /// date, else the last day of Esfand of the last year.
    ///
    /// # Errors
    /// Returns `RangeError::Date` if the last year has no representable end.
    pub fn end_date(&self) -> Result<CalendarDate, RangeError> {
        if let Some(last) = self.selectable_days.values().next_back() {
            return Ok(last.clone());
        }
        if let Some(max) = &self.max_date {
            return Ok(max.clone());
        }
        self.last_of_year(self.max_year)
    }

    fn first_of_year(&self, year: i32) -> Result<CalendarDate, RangeError> {
        let date = PersianDate::first_of_year(year)?;
        Ok(CalendarDate::from_persian_date(date, self.time_zone.clone())?)
    }

    fn last_of_year(&self, year: i32) -> Result<CalendarDate, RangeError> {
        let date = PersianDate::last_of_year(year)?;
        Ok(CalendarDate::from_persian_date(date, self.time_zone.clone())?)
    }

    /// Whether the Persian day (0-based month) may not be picked. Triples that
    /// are not real dates are always out of range.
    pub fn is_out_of_range(&self, year: i32, month: u8, day: u8) -> bool {
        match CalendarDate::from_persian(year, month, day, self.time_zone.clone()) {
            Ok(date) => self.is_date_out_of_range(&date),
            Err(err) => {
                trace!(year, month, day, %err, "not a valid date");
                true
            },
        }
    }

    /// Whether the local day of `date` may not be picked.
    pub fn is_date_out_of_range(&self, date: &CalendarDate) -> bool {
        self.is_disabled(date) || !self.is_selectable(date)
    }

    fn is_disabled(&self, date: &CalendarDate) -> bool {
        self.disabled_days.contains_key(&date.julian_day())
            || self.is_before_min(date)
            || self.is_after_max(date)
    }

    fn is_selectable(&self, date: &CalendarDate) -> bool {
        self.selectable_days.is_empty() || self.selectable_days.contains_key(&date.julian_day())
    }

    // Bounds are only consulted while no selectable days are configured.
    fn is_before_min(&self, date: &CalendarDate) -> bool {
        self.selectable_days.is_empty()
            && (self
                .min_date
                .as_ref()
                .is_some_and(|min| date.julian_day() < min.julian_day())
                || date.persian_year() < self.min_year)
    }

    fn is_after_max(&self, date: &CalendarDate) -> bool {
        self.selectable_days.is_empty()
            && (self
                .max_date
                .as_ref()
                .is_some_and(|max| date.julian_day() > max.julian_day())
                || date.persian_year() > self.max_year)
    }

    /// Moves `date` to the nearest day that may be picked.
    ///
    /// With selectable days, the closer of the neighbouring selectable days
    /// wins, the later one on a tie. With disabled days, the search walks
    /// backward and forward one day at a time and the backward day wins if
    /// both become valid on the same step. Otherwise the date is clamped into
    /// the minimum and maximum bounds. A date that may already be picked is
    /// returned unchanged.
    ///
    /// # Errors
    /// Returns `RangeError::Date` if a bound or a step of the search cannot be
    /// represented.
    pub fn set_to_nearest_date(&self, date: &CalendarDate) -> Result<CalendarDate, RangeError> {
        if !self.selectable_days.is_empty() {
            return Ok(self.nearest_selectable(date));
        }

        if !self.disabled_days.is_empty() {
            if let Some(found) = self.nearest_enabled(date)? {
                return Ok(found);
            }
        }

        self.clamp(date)
    }

    fn nearest_selectable(&self, date: &CalendarDate) -> CalendarDate {
        let key = date.julian_day();
        let enabled = |(day, _): &(&i64, &CalendarDate)| !self.disabled_days.contains_key(*day);
        let higher = self.selectable_days.range(key..).find(enabled).map(|(_, d)| d);
        let lower = self.selectable_days.range(..key).rev().find(enabled).map(|(_, d)| d);

        match (lower, higher) {
            (_, Some(high)) if high.julian_day() == key => date.clone(),
            (Some(low), None) => low.clone(),
            (None, Some(high)) => high.clone(),
            (Some(low), Some(high)) => {
                let low_distance = date.millis().abs_diff(low.millis());
                let high_distance = high.millis().abs_diff(date.millis());
                trace!(%low, %high, low_distance, high_distance, "choosing nearest selectable day");
                if low_distance < high_distance {
                    low.clone()
                } else {
                    high.clone()
                }
            },
            (None, None) => {
                trace!(%date, "every selectable day is disabled");
                date.clone()
            },
        }
    }

    /// Walks outward from `date` until a day is not disabled. Returns `None`
    /// when every day between the bounds is disabled.
    fn nearest_enabled(&self, date: &CalendarDate) -> Result<Option<CalendarDate>, RangeError> {
        let start = self.start_date()?;
        let end = self.end_date()?;

        let mut forward = if self.is_before_min(date) {
            start.clone()
        } else {
            date.clone()
        };
        let mut backward = if self.is_after_max(date) {
            end.clone()
        } else {
            date.clone()
        };

        while self.is_disabled(&forward) && self.is_disabled(&backward) {
            if forward.julian_day() > end.julian_day() && backward.julian_day() < start.julian_day() {
                trace!(%date, "every day between the bounds is disabled");
                return Ok(None);
            }
            forward = forward.add_days(1)?;
            backward = backward.add_days(-1)?;
        }

        if self.is_disabled(&backward) {
            trace!(%date, %forward, "moved forward past disabled days");
            Ok(Some(forward))
        } else {
            trace!(%date, %backward, "moved backward past disabled days");
            Ok(Some(backward))
        }
    }

    /// Clamps into the tighter of the explicit date bound and the year span.
    fn clamp(&self, date: &CalendarDate) -> Result<CalendarDate, RangeError> {
        if self.is_before_min(date) {
            let first = self.first_of_year(self.min_year)?;
            let bound = match &self.min_date {
                Some(min) if min.julian_day() >= first.julian_day() => min.clone(),
                _ => first,
            };
            trace!(%date, %bound, "clamped to the minimum");
            return Ok(bound);
        }

        if self.is_after_max(date) {
            let last = self.last_of_year(self.max_year)?;
            let bound = match &self.max_date {
                Some(max) if max.julian_day() <= last.julian_day() => max.clone(),
                _ => last,
            };
            trace!(%date, %bound, "clamped to the maximum");
            return Ok(bound);
        }

        Ok(date.clone())
    }

    /// Snapshot of the full configuration.
    pub fn state(&self) -> LimiterState {
        LimiterState::from(self.clone())
    }

    /// Serializes the full configuration into an opaque byte form.
    ///
    /// A time zone with an IANA name is stored by name and restored exactly.
    /// Any other zone, such as a POSIX `TZ` rule with daylight saving time,
    /// is stored as its current UTC offset and restored as that fixed
    /// offset, so its transitions are lost.
    ///
    /// # Errors
    /// Returns `RangeError::Persist` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RangeError> {
        serde_json::to_vec(self).map_err(|e| RangeError::Persist(e.to_string()))
    }

    /// Restores a limiter written by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    /// Returns `RangeError::Persist` if the bytes are not a valid limiter state.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RangeError> {
        serde_json::from_slice(bytes).map_err(|e| RangeError::Persist(e.to_string()))
    }
}

/// Stored form of a [`DateRangeLimiter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterState {
    pub min_year:        i32,
    pub max_year:        i32,
    pub min_date:        Option<CalendarDate>,
    pub max_date:        Option<CalendarDate>,
    pub selectable_days: Vec<CalendarDate>,
    pub disabled_days:   Vec<CalendarDate>,
    /// Offset at the time of the snapshot for zones without an IANA name
    pub time_zone:       ZoneKey,
}

impl From<DateRangeLimiter> for LimiterState {
    fn from(limiter: DateRangeLimiter) -> Self {
        Self {
            time_zone:       ZoneKey::of(&limiter.time_zone, Timestamp::now()),
            min_year:        limiter.min_year,
            max_year:        limiter.max_year,
            min_date:        limiter.min_date,
            max_date:        limiter.max_date,
            selectable_days: limiter.selectable_days.into_values().collect(),
            disabled_days:   limiter.disabled_days.into_values().collect(),
        }
    }
}

impl TryFrom<LimiterState> for DateRangeLimiter {
    type Error = RangeError;

    fn try_from(state: LimiterState) -> Result<Self, Self::Error> {
        let limiter = Self {
            min_year:        state.min_year,
            max_year:        state.max_year,
            min_date:        state.min_date.as_ref().map(CalendarDate::at_midnight).transpose()?,
            max_date:        state.max_date.as_ref().map(CalendarDate::at_midnight).transpose()?,
            selectable_days: Self::day_set(&state.selectable_days)?,
            disabled_days:   Self::day_set(&state.disabled_days)?,
            time_zone:       state.time_zone.to_time_zone()?,
        };
        limiter.check_bounds()?;
        Ok(limiter)
    }
}
