use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const MS_PER_DAY: f64 = 86_400_000.0;
const CUMULATIVE_DAYS: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Declares how much of a `ChronosTime` substructure is meaningful.
///
/// Variants are ordered from coarsest to finest. `Unknown` sorts last but is
/// displayed like `Year`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TimePrecision {
    Millennium,
    Century,
    Decade,
    #[default]
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Unknown,
}

impl TimePrecision {
    fn depth(self) -> u8 {
        match self {
            Self::Millennium | Self::Century | Self::Decade | Self::Year | Self::Unknown => 0,
            Self::Month => 1,
            Self::Day => 2,
            Self::Hour => 3,
            Self::Minute => 4,
            Self::Second => 5,
            Self::Millisecond => 6,
        }
    }

    /// Returns `true` when `field` is at least as coarse as this precision.
    #[must_use]
    pub fn shows(self, field: TimePrecision) -> bool {
        field.depth() <= self.depth()
    }
}

/// A point in calendar time.
///
/// `year` is the historical year: negative values are BCE and there is no
/// year zero (`-1` is 1 BCE). Fields finer than `precision` may still carry
/// values; they take part in ordering but not in display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChronosTime {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub millisecond: Option<u16>,
    #[serde(default)]
    pub precision: TimePrecision,
}

impl ChronosTime {
    #[must_use]
    pub fn from_year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
            millisecond: None,
            precision: TimePrecision::Year,
        }
    }

    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Self {
        Self {
            month: Some(month),
            day: Some(day),
            precision: TimePrecision::Day,
            ..Self::from_year(year)
        }
    }

    #[must_use]
    pub fn with_month(mut self, month: u8) -> Self {
        self.month = Some(month);
        if self.precision < TimePrecision::Month {
            self.precision = TimePrecision::Month;
        }
        self
    }

    #[must_use]
    pub fn with_time(mut self, hour: u8, minute: u8, second: u8) -> Self {
        self.hour = Some(hour);
        self.minute = Some(minute);
        self.second = Some(second);
        self.precision = TimePrecision::Second;
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: TimePrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Builds a millisecond-precision time from a UTC timestamp.
    ///
    /// `chrono` counts years astronomically, so years `<= 0` shift down by one.
    #[must_use]
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        let astro = time.year();
        let year = if astro > 0 { astro } else { astro - 1 };
        let millis = time.timestamp_subsec_millis().min(999);
        Self {
            year,
            month: Some(time.month() as u8),
            day: Some(time.day() as u8),
            hour: Some(time.hour() as u8),
            minute: Some(time.minute() as u8),
            second: Some(time.second().min(59) as u8),
            millisecond: Some(millis as u16),
            precision: TimePrecision::Millisecond,
        }
    }

    /// Converts to a UTC timestamp when the year lies inside `chrono`'s range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let astro = i32::try_from(self.astro_year()).ok()?;
        let date = NaiveDate::from_ymd_opt(
            astro,
            u32::from(self.month.unwrap_or(1)),
            u32::from(self.day.unwrap_or(1)),
        )?;
        let naive = date.and_hms_milli_opt(
            u32::from(self.hour.unwrap_or(0)),
            u32::from(self.minute.unwrap_or(0)),
            u32::from(self.second.unwrap_or(0)),
            u32::from(self.millisecond.unwrap_or(0)),
        )?;
        Some(naive.and_utc())
    }

    pub fn validate(self) -> EngineResult<Self> {
        if self.year == 0 {
            return Err(EngineError::InvalidData(
                "historical year 0 does not exist (use -1 for 1 BCE)".to_owned(),
            ));
        }
        let astro = self.astro_year();
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(EngineError::InvalidData(format!(
                    "month must be within 1..=12, got {month}"
                )));
            }
            if let Some(day) = self.day {
                let max_day = days_in_month(astro, month);
                if day == 0 || day > max_day {
                    return Err(EngineError::InvalidData(format!(
                        "day must be within 1..={max_day}, got {day}"
                    )));
                }
            }
        } else if let Some(day) = self.day {
            if day == 0 || day > 31 {
                return Err(EngineError::InvalidData(format!(
                    "day must be within 1..=31, got {day}"
                )));
            }
        }
        for (value, limit, name) in [
            (self.hour, 24, "hour"),
            (self.minute, 60, "minute"),
            (self.second, 60, "second"),
        ] {
            if value.is_some_and(|v| v >= limit) {
                return Err(EngineError::InvalidData(format!(
                    "{name} must be < {limit}"
                )));
            }
        }
        if self.millisecond.is_some_and(|ms| ms >= 1000) {
            return Err(EngineError::InvalidData(
                "millisecond must be < 1000".to_owned(),
            ));
        }
        Ok(self)
    }

    /// Continuous year without the missing year zero: 1 CE = 1, 1 BCE = 0, 2 BCE = -1.
    #[must_use]
    pub fn astro_year(self) -> i64 {
        let year = i64::from(self.year);
        if year > 0 { year } else { year + 1 }
    }

    /// Maps this instant onto the continuous time axis.
    ///
    /// The integer part is the astro year, the fractional part the position
    /// inside that year. Missing month/day count as January 1st.
    #[must_use]
    pub fn to_slider_value(self) -> f64 {
        let astro = self.astro_year();
        let month = self.month.unwrap_or(1).clamp(1, 12);
        let day = self.day.unwrap_or(1).max(1);
        let day_of_year = day_of_year0(astro, month, day);
        let ms_of_day = f64::from(self.hour.unwrap_or(0)) * 3_600_000.0
            + f64::from(self.minute.unwrap_or(0)) * 60_000.0
            + f64::from(self.second.unwrap_or(0)) * 1_000.0
            + f64::from(self.millisecond.unwrap_or(0));
        let fraction = (f64::from(day_of_year) + ms_of_day / MS_PER_DAY)
            / f64::from(days_in_year(astro));
        astro as f64 + fraction
    }

    /// Rebuilds a calendar time from a slider value, keeping fields down to `precision`.
    pub fn from_slider_value(value: f64, precision: TimePrecision) -> EngineResult<Self> {
        if !value.is_finite() {
            return Err(EngineError::InvalidData(
                "slider value must be finite".to_owned(),
            ));
        }
        let floor = value.floor();
        if floor < f64::from(i32::MIN) + 1.0 || floor > f64::from(i32::MAX) - 1.0 {
            return Err(EngineError::InvalidData(format!(
                "slider value {value} is outside the representable year range"
            )));
        }
        let mut astro = floor as i64;
        let mut year_ms = ((value - floor) * f64::from(days_in_year(astro)) * MS_PER_DAY).round();
        if year_ms >= f64::from(days_in_year(astro)) * MS_PER_DAY {
            astro += 1;
            year_ms = 0.0;
        }
        let year_ms = year_ms as i64;
        let day_index = (year_ms / 86_400_000) as u16;
        let mut rest = year_ms % 86_400_000;
        let (month, day) = month_day_from_ordinal0(astro, day_index);
        let hour = (rest / 3_600_000) as u8;
        rest %= 3_600_000;
        let minute = (rest / 60_000) as u8;
        rest %= 60_000;
        let second = (rest / 1_000) as u8;
        let millisecond = (rest % 1_000) as u16;

        let year = if astro > 0 { astro } else { astro - 1 };
        let keep = |field: TimePrecision| precision.shows(field);
        Ok(Self {
            year: year as i32,
            month: keep(TimePrecision::Month).then_some(month),
            day: keep(TimePrecision::Day).then_some(day),
            hour: keep(TimePrecision::Hour).then_some(hour),
            minute: keep(TimePrecision::Minute).then_some(minute),
            second: keep(TimePrecision::Second).then_some(second),
            millisecond: keep(TimePrecision::Millisecond).then_some(millisecond),
            precision,
        })
    }
}

impl fmt::Display for ChronosTime {
    /// Presentation-only rendering; fields finer than `precision` are omitted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bce = self.year < 0;
        let year = self.year.unsigned_abs();
        match self.precision {
            TimePrecision::Millennium => {
                let n = year.div_ceil(1000).max(1);
                write!(f, "{}{} millennium", n, ordinal_suffix(n))?;
            }
            TimePrecision::Century => {
                let n = year.div_ceil(100).max(1);
                write!(f, "{}{} century", n, ordinal_suffix(n))?;
            }
            TimePrecision::Decade => write!(f, "{}s", year - year % 10)?,
            _ => {
                write!(f, "{year}")?;
                let p = self.precision;
                if let (true, Some(month)) = (p.shows(TimePrecision::Month), self.month) {
                    write!(f, "-{month:02}")?;
                    if let (true, Some(day)) = (p.shows(TimePrecision::Day), self.day) {
                        write!(f, "-{day:02}")?;
                    }
                }
                if let (true, Some(hour)) = (p.shows(TimePrecision::Hour), self.hour) {
                    write!(f, " {hour:02}")?;
                    let minute = self.minute.unwrap_or(0);
                    if p.shows(TimePrecision::Minute) {
                        write!(f, ":{minute:02}")?;
                    } else {
                        write!(f, "h")?;
                    }
                    if p.shows(TimePrecision::Second) {
                        write!(f, ":{:02}", self.second.unwrap_or(0))?;
                    }
                    if p.shows(TimePrecision::Millisecond) {
                        write!(f, ".{:03}", self.millisecond.unwrap_or(0))?;
                    }
                }
            }
        }
        if bce {
            write!(f, " BCE")?;
        }
        Ok(())
    }
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Proleptic Gregorian leap rule on astronomical years (astro year 0 is leap).
#[must_use]
pub fn is_leap_astro_year(astro_year: i64) -> bool {
    (astro_year.rem_euclid(4) == 0 && astro_year.rem_euclid(100) != 0)
        || astro_year.rem_euclid(400) == 0
}

fn days_in_year(astro_year: i64) -> u16 {
    if is_leap_astro_year(astro_year) { 366 } else { 365 }
}

fn days_in_month(astro_year: i64, month: u8) -> u8 {
    match month {
        2 if is_leap_astro_year(astro_year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn day_of_year0(astro_year: i64, month: u8, day: u8) -> u16 {
    let index = usize::from(month - 1);
    let leap_shift = u16::from(month > 2 && is_leap_astro_year(astro_year));
    let day = day.min(days_in_month(astro_year, month));
    CUMULATIVE_DAYS[index] + leap_shift + u16::from(day) - 1
}

fn month_day_from_ordinal0(astro_year: i64, ordinal0: u16) -> (u8, u8) {
    let mut remaining = ordinal0;
    for month in 1..=12u8 {
        let len = u16::from(days_in_month(astro_year, month));
        if remaining < len {
            return (month, remaining as u8 + 1);
        }
        remaining -= len;
    }
    (12, 31)
}
