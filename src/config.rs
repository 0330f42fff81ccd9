//! Declarative limiter configuration, e.g. loaded from a JSON file.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CalendarDate, DEFAULT_END_YEAR, DEFAULT_START_YEAR, DateError, DateRangeLimiter, PersianDate,
    RangeError, TimeZone, ZoneKey,
};

/// Everything a [`DateRangeLimiter`] can be configured with. Dates are
/// Persian `YYYY/MM/DD` strings with a 1-based month; missing fields take
/// the limiter defaults.
///
/// ```json
/// {
///   "min_year": 1400,
///   "max_year": 1405,
///   "time_zone": "Asia/Tehran",
///   "disabled_days": ["1403/01/01", "1403/01/13"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimiterConfig {
    pub min_year:        i32,
    pub max_year:        i32,
    /// IANA time zone name; the system zone when absent
    pub time_zone:       Option<String>,
    pub min_date:        Option<PersianDate>,
    pub max_date:        Option<PersianDate>,
    pub selectable_days: Vec<PersianDate>,
    pub disabled_days:   Vec<PersianDate>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            min_year:        DEFAULT_START_YEAR,
            max_year:        DEFAULT_END_YEAR,
            time_zone:       None,
            min_date:        None,
            max_date:        None,
            selectable_days: Vec::new(),
            disabled_days:   Vec::new(),
        }
    }
}

impl LimiterConfig {
    /// Parses a JSON configuration and builds the limiter it describes.
    ///
    /// # Errors
    /// Returns `RangeError::Config` for malformed JSON and any error of
    /// [`build`](Self::build).
    pub fn from_json(json: &str) -> Result<DateRangeLimiter, RangeError> {
        let config: Self = serde_json::from_str(json).map_err(|e| RangeError::Config(e.to_string()))?;
        config.build()
    }

    /// Builds a limiter from this configuration.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidRange` or `RangeError::InvalidDateRange`
    /// for inverted bounds and `RangeError::Date` for an unknown time zone or
    /// an unrepresentable date.
    pub fn build(&self) -> Result<DateRangeLimiter, RangeError> {
        let zone = self.time_zone()?;
        let to_date = |date: &PersianDate| CalendarDate::from_persian_date(*date, zone.clone());

        let mut limiter = DateRangeLimiter::new().with_time_zone(zone.clone());
        limiter.set_year_range(self.min_year, self.max_year)?;
        if let Some(min) = &self.min_date {
            limiter.set_min_date(&to_date(min)?)?;
        }
        if let Some(max) = &self.max_date {
            limiter.set_max_date(&to_date(max)?)?;
        }
        let selectable = self.selectable_days.iter().map(to_date).collect::<Result<Vec<_>, _>>()?;
        limiter.set_selectable_days(&selectable)?;
        let disabled = self.disabled_days.iter().map(to_date).collect::<Result<Vec<_>, _>>()?;
        limiter.set_disabled_days(&disabled)?;

        debug!(
            min_year = limiter.min_year(),
            max_year = limiter.max_year(),
            zone = ?zone.iana_name(),
            "limiter built from configuration"
        );
        Ok(limiter)
    }

    fn time_zone(&self) -> Result<TimeZone, DateError> {
        self.time_zone
            .as_ref()
            .map_or_else(|| Ok(TimeZone::system()), |name| ZoneKey::Named(name.clone()).to_time_zone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let limiter = LimiterConfig::from_json(r#"{"time_zone": "UTC"}"#).unwrap();
        assert_eq!(limiter.min_year(), DEFAULT_START_YEAR);
        assert_eq!(limiter.max_year(), DEFAULT_END_YEAR);
        assert!(limiter.selectable_days().is_none());
        assert!(limiter.disabled_days().is_none());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "min_year": 1400,
            "max_year": 1405,
            "time_zone": "UTC",
            "min_date": "1401/02/03",
            "max_date": "1404/12/29",
            "disabled_days": ["1403/01/01", "1403/01/13"]
        }"#;
        let limiter = LimiterConfig::from_json(json).unwrap();

        assert_eq!(limiter.min_year(), 1401);
        assert_eq!(limiter.max_year(), 1404);
        assert_eq!(limiter.start_date().unwrap().persian().to_tuple(), (1401, 1, 3));
        assert_eq!(limiter.end_date().unwrap().persian().to_tuple(), (1404, 11, 29));
        assert!(limiter.is_out_of_range(1403, 0, 1));
        assert!(limiter.is_out_of_range(1403, 0, 13));
        assert!(!limiter.is_out_of_range(1403, 0, 2));
    }

    #[test]
    fn test_selectable_config() {
        let json = r#"{
            "time_zone": "UTC",
            "selectable_days": ["1402/10/20", "1402/10/25"]
        }"#;
        let limiter = LimiterConfig::from_json(json).unwrap();

        assert!(!limiter.is_out_of_range(1402, 9, 20));
        assert!(limiter.is_out_of_range(1402, 9, 21));
        assert_eq!(limiter.min_year(), 1402);
    }

    #[test]
    fn test_config_errors() {
        struct TestCase {
            json:        &'static str,
            description: &'static str,
        }

        let cases = [
            TestCase {
                json:        r#"{"min_year": 1410, "max_year": 1400, "time_zone": "UTC"}"#,
                description: "inverted year range",
            },
            TestCase {
                json:        r#"{"min_date": "1403/01/10", "max_date": "1403/01/01", "time_zone": "UTC"}"#,
                description: "maximum date before minimum date",
            },
            TestCase {
                json:        r#"{"disabled_days": ["1403/07/31"], "time_zone": "UTC"}"#,
                description: "impossible date",
            },
            TestCase {
                json:        r#"{"time_zone": "Mars/Olympus_Mons"}"#,
                description: "unknown time zone",
            },
            TestCase {
                json:        r#"{"minimum": 1400}"#,
                description: "unknown field",
            },
            TestCase {
                json:        "not json",
                description: "malformed input",
            },
        ];

        for case in &cases {
            assert!(
                LimiterConfig::from_json(case.json).is_err(),
                "Expected failure for: {}",
                case.description
            );
        }
    }

    #[test]
    fn test_unknown_time_zone_error() {
        let config = LimiterConfig {
            time_zone: Some("Mars/Olympus_Mons".to_owned()),
            ..LimiterConfig::default()
        };
        assert_eq!(
            config.build().map(|_| ()),
            Err(RangeError::Date(DateError::UnknownTimeZone("Mars/Olympus_Mons".to_owned())))
        );
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = LimiterConfig {
            min_year: 1390,
            max_year: 1399,
            time_zone: Some("UTC".to_owned()),
            disabled_days: vec![PersianDate::new(1395, 0, 1).unwrap()],
            ..LimiterConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LimiterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert!(json.contains(r#""1395/01/01""#));
    }
}
