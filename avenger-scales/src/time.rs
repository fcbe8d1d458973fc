//! UTC calendar intervals and time tick generation.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Timelike, Utc};
use strum::{Display, EnumString, VariantNames};

use crate::array::tick_step;

pub const MILLISECOND: f64 = 1.0;
pub const SECOND: f64 = 1000.0;
pub const MINUTE: f64 = SECOND * 60.0;
pub const HOUR: f64 = MINUTE * 60.0;
pub const DAY: f64 = HOUR * 24.0;
pub const WEEK: f64 = DAY * 7.0;
pub const MONTH: f64 = DAY * 30.0;
pub const YEAR: f64 = DAY * 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeUnit {
    /// Approximate duration of one unit in milliseconds
    pub fn duration_ms(&self) -> f64 {
        match self {
            TimeUnit::Millisecond => MILLISECOND,
            TimeUnit::Second => SECOND,
            TimeUnit::Minute => MINUTE,
            TimeUnit::Hour => HOUR,
            TimeUnit::Day => DAY,
            TimeUnit::Week => WEEK,
            TimeUnit::Month => MONTH,
            TimeUnit::Quarter => MONTH * 3.0,
            TimeUnit::Year => YEAR,
        }
    }
}

/// A calendar interval such as "1 day" or "3 months". Stepped intervals are
/// aligned to multiples of the step within the enclosing unit (hours within
/// a day, months within a year, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub unit: TimeUnit,
    pub step: u32,
}

impl TimeInterval {
    pub fn new(unit: TimeUnit, step: u32) -> Self {
        Self {
            unit,
            step: step.max(1),
        }
    }

    pub fn floor(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        let step = self.step as i64;
        let naive = date.naive_utc();
        let d = naive.date();
        let floored = match self.unit {
            TimeUnit::Millisecond => {
                let ms = date.timestamp_millis();
                return DateTime::from_timestamp_millis(ms - ms.rem_euclid(step)).unwrap_or(date);
            }
            TimeUnit::Second => {
                let s = naive.second() as i64;
                d.and_hms_opt(naive.hour(), naive.minute(), (s - s % step) as u32)
            }
            TimeUnit::Minute => {
                let m = naive.minute() as i64;
                d.and_hms_opt(naive.hour(), (m - m % step) as u32, 0)
            }
            TimeUnit::Hour => {
                let h = naive.hour() as i64;
                d.and_hms_opt((h - h % step) as u32, 0, 0)
            }
            TimeUnit::Day => {
                let day0 = d.day0() as i64;
                NaiveDate::from_ymd_opt(d.year(), d.month(), (day0 - day0 % step) as u32 + 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }
            TimeUnit::Week => {
                let sunday = d - TimeDelta::days(d.weekday().num_days_from_sunday() as i64);
                let weeks = (sunday - epoch_sunday()).num_days() / 7;
                let aligned = sunday - TimeDelta::days(7 * weeks.rem_euclid(step));
                aligned.and_hms_opt(0, 0, 0)
            }
            TimeUnit::Month | TimeUnit::Quarter => {
                let months = if self.unit == TimeUnit::Quarter {
                    step * 3
                } else {
                    step
                };
                let m0 = d.month0() as i64;
                NaiveDate::from_ymd_opt(d.year(), (m0 - m0 % months) as u32 + 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }
            TimeUnit::Year => {
                let y = d.year() as i64;
                NaiveDate::from_ymd_opt((y - y.rem_euclid(step)) as i32, 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }
        };
        floored.map(|n| n.and_utc()).unwrap_or(date)
    }

    /// Move `date` by `n` steps of this interval (negative `n` moves back)
    pub fn offset(&self, date: DateTime<Utc>, n: i64) -> DateTime<Utc> {
        let k = n * self.step as i64;
        let shifted = match self.unit {
            TimeUnit::Millisecond => TimeDelta::try_milliseconds(k),
            TimeUnit::Second => TimeDelta::try_seconds(k),
            TimeUnit::Minute => TimeDelta::try_minutes(k),
            TimeUnit::Hour => TimeDelta::try_hours(k),
            TimeUnit::Day => TimeDelta::try_days(k),
            TimeUnit::Week => TimeDelta::try_weeks(k),
            TimeUnit::Month => return add_months(date, k),
            TimeUnit::Quarter => return add_months(date, k * 3),
            TimeUnit::Year => return add_months(date, k * 12),
        }
        .and_then(|delta| date.checked_add_signed(delta));
        shifted.unwrap_or(date)
    }

    pub fn ceil(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        let before = date - TimeDelta::milliseconds(1);
        let floored = self.floor(before);
        self.floor(self.offset(floored, 1))
    }

    /// Interval boundaries `t` with `start <= t < stop`
    pub fn range(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let mut t = self.ceil(start);
        while t < stop {
            out.push(t);
            let mut next = self.floor(self.offset(t, 1));
            if next <= t {
                next = self.offset(t, 1);
                if next <= t {
                    break;
                }
            }
            t = next;
        }
        out
    }

    /// Floor for a timestamp in milliseconds
    pub fn floor_ms(&self, ms: f64) -> f64 {
        self.map_ms(ms, |d| self.floor(d))
    }

    pub fn ceil_ms(&self, ms: f64) -> f64 {
        self.map_ms(ms, |d| self.ceil(d))
    }

    pub fn offset_ms(&self, ms: f64, n: i64) -> f64 {
        self.map_ms(ms, |d| self.offset(d, n))
    }

    fn map_ms(&self, ms: f64, f: impl Fn(DateTime<Utc>) -> DateTime<Utc>) -> f64 {
        match from_ms(ms) {
            Some(d) => f(d).timestamp_millis() as f64,
            None => f64::NAN,
        }
    }
}

fn epoch_sunday() -> NaiveDate {
    // 1970-01-04 was the first Sunday after the epoch
    NaiveDate::from_ymd_opt(1970, 1, 4).unwrap_or_default()
}

fn add_months(date: DateTime<Utc>, months: i64) -> DateTime<Utc> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs() as u32))
    };
    shifted.unwrap_or(date)
}

/// Convert a millisecond timestamp to a UTC date
pub fn from_ms(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

const TICK_INTERVALS: [(TimeUnit, u32, f64); 17] = [
    (TimeUnit::Second, 1, SECOND),
    (TimeUnit::Second, 5, 5.0 * SECOND),
    (TimeUnit::Second, 15, 15.0 * SECOND),
    (TimeUnit::Second, 30, 30.0 * SECOND),
    (TimeUnit::Minute, 1, MINUTE),
    (TimeUnit::Minute, 5, 5.0 * MINUTE),
    (TimeUnit::Minute, 15, 15.0 * MINUTE),
    (TimeUnit::Minute, 30, 30.0 * MINUTE),
    (TimeUnit::Hour, 1, HOUR),
    (TimeUnit::Hour, 3, 3.0 * HOUR),
    (TimeUnit::Hour, 6, 6.0 * HOUR),
    (TimeUnit::Hour, 12, 12.0 * HOUR),
    (TimeUnit::Day, 1, DAY),
    (TimeUnit::Day, 2, 2.0 * DAY),
    (TimeUnit::Week, 1, WEEK),
    (TimeUnit::Month, 1, MONTH),
    (TimeUnit::Month, 3, 3.0 * MONTH),
];

/// Pick the calendar interval whose duration best matches `count` ticks
/// over `[start_ms, stop_ms]`.
pub fn tick_interval(start_ms: f64, stop_ms: f64, count: f64) -> TimeInterval {
    let target = (stop_ms - start_ms).abs() / count;
    let i = TICK_INTERVALS.partition_point(|(_, _, d)| *d <= target);
    if i == TICK_INTERVALS.len() {
        let step = tick_step(start_ms / YEAR, stop_ms / YEAR, count).abs().floor();
        return TimeInterval::new(TimeUnit::Year, step.max(1.0) as u32);
    }
    if i == 0 {
        let step = tick_step(start_ms, stop_ms, count).abs().floor();
        return TimeInterval::new(TimeUnit::Millisecond, step.max(1.0) as u32);
    }
    let (lower, upper) = (TICK_INTERVALS[i - 1], TICK_INTERVALS[i]);
    let (unit, step, _) = if target / lower.2 < upper.2 / target {
        lower
    } else {
        upper
    };
    TimeInterval::new(unit, step)
}

/// Time ticks as millisecond timestamps, inclusive of both ends
pub fn time_ticks(start_ms: f64, stop_ms: f64, count: f64) -> Vec<f64> {
    if !start_ms.is_finite() || !stop_ms.is_finite() || !(count > 0.0) {
        return vec![];
    }
    let reverse = stop_ms < start_ms;
    let (lo, hi) = if reverse {
        (stop_ms, start_ms)
    } else {
        (start_ms, stop_ms)
    };
    let interval = tick_interval(lo, hi, count);
    let (Some(lo_date), Some(hi_date)) = (from_ms(lo), from_ms(hi + 1.0)) else {
        return vec![];
    };
    let mut ticks: Vec<f64> = interval
        .range(lo_date, hi_date)
        .into_iter()
        .map(|d| d.timestamp_millis() as f64)
        .collect();
    if reverse {
        ticks.reverse();
    }
    ticks
}

/// Extend `[start_ms, stop_ms]` outward to tick interval boundaries
pub fn time_nice(start_ms: f64, stop_ms: f64, count: f64) -> (f64, f64) {
    let reverse = stop_ms < start_ms;
    let (lo, hi) = if reverse {
        (stop_ms, start_ms)
    } else {
        (start_ms, stop_ms)
    };
    let interval = tick_interval(lo, hi, count);
    let (lo, hi) = (interval.floor_ms(lo), interval.ceil_ms(hi));
    if reverse {
        (hi, lo)
    } else {
        (lo, hi)
    }
}
