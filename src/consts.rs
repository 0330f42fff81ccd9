/// Milliseconds between the Julian day epoch and the Unix epoch (negative)
pub const MILLIS_JULIAN_EPOCH: i64 = -210_866_803_200_000;

/// Milliseconds in one civil day
pub const MILLIS_OF_A_DAY: i64 = 86_400_000;

/// Julian day number of 1 Farvardin, year 1
pub const PERSIAN_EPOCH: i64 = 1_948_321;

/// Julian day number of 1970-01-01
pub const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_588;

/// Seconds in one civil day
pub(crate) const SECONDS_OF_A_DAY: i64 = 86_400;

/// Years in one grand intercalation cycle
pub(crate) const GRAND_CYCLE_YEARS: i64 = 2820;
/// Days in one grand intercalation cycle
pub(crate) const GRAND_CYCLE_DAYS: i64 = 1_029_983;
/// Year the grand cycles are anchored on
pub(crate) const CYCLE_BASE_YEAR: i64 = 474;

/// Number of months in a Persian year
pub const MONTHS_IN_YEAR: u8 = 12;

/// Month index of Farvardin (months are 0-indexed)
pub const FARVARDIN: u8 = 0;
/// Month index of Esfand, the last month
pub const ESFAND: u8 = 11;

/// First day of month, used for lower bounds
pub const MIN_DAY: u8 = 1;

/// Days in Esfand for leap years
pub const ESFAND_DAYS_LEAP: u8 = 30;

/// Days in each month (months are 0-indexed)
/// Esfand shows 29 days (non-leap year default)
pub const DAYS_IN_MONTH: [u8; 12] = [
    31, // Farvardin
    31, // Ordibehesht
    31, // Khordad
    31, // Tir
    31, // Mordad
    31, // Shahrivar
    30, // Mehr
    30, // Aban
    30, // Azar
    30, // Dey
    30, // Bahman
    29, // Esfand (non-leap, adjusted by is_leap_year check)
];

/// Persian month names, indexed by 0-based month
pub const MONTH_NAMES: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

/// Persian weekday names; the Persian week starts on Saturday
pub const WEEKDAY_NAMES: [&str; 7] = [
    "شنبه",
    "یک\u{200c}شنبه",
    "دوشنبه",
    "سه\u{200c}شنبه",
    "چهارشنبه",
    "پنج\u{200c}شنبه",
    "جمعه",
];

/// Days from the start of the year to the start of Mehr
pub(crate) const FIRST_HALF_DAYS: i64 = 186;

/// Default first selectable year of a limiter
pub const DEFAULT_START_YEAR: i32 = 1300;
/// Default last selectable year of a limiter
pub const DEFAULT_END_YEAR: i32 = 1500;

/// Date component separator (`YYYY/MM/DD`)
pub const DATE_SEPARATOR: char = '/';
