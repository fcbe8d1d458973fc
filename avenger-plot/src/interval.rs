//! Numeric and calendar intervals over raw values.

use std::str::FromStr;

use avenger_scales::time::{TimeInterval, TimeUnit};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AvengerPlotError;
use crate::value::{parse_number, RawValue};

lazy_static! {
    static ref INTERVAL_RE: Regex = Regex::new(r"^(\d+)?\s*([a-z]+)$").unwrap();
    static ref SIGNED_RE: Regex = Regex::new(r"^([+-])\s*(.+)$").unwrap();
}

/// A bucketing step: a fixed numeric width or a calendar interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interval {
    Number(f64),
    Time(TimeInterval),
}

impl Interval {
    pub fn number(step: f64) -> Result<Self, AvengerPlotError> {
        if step.is_finite() && step > 0.0 {
            Ok(Interval::Number(step))
        } else {
            Err(AvengerPlotError::InvalidInterval(step.to_string()))
        }
    }

    pub fn time(unit: TimeUnit, step: u32) -> Self {
        Interval::Time(TimeInterval::new(unit, step))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Interval::Time(_))
    }

    /// Nominal width, in milliseconds for calendar intervals
    pub fn width(&self) -> f64 {
        match self {
            Interval::Number(step) => *step,
            Interval::Time(t) => t.unit.duration_ms() * t.step as f64,
        }
    }

    pub fn floor(&self, value: &RawValue) -> RawValue {
        match self {
            Interval::Number(step) => value.with_number(floor_number(value.to_f64(), *step)),
            Interval::Time(t) => match value.as_date() {
                Some(d) => RawValue::Date(t.floor(d)),
                _ => value.with_number(t.floor_ms(value.to_f64())),
            },
        }
    }

    /// Move by `n` steps
    pub fn offset(&self, value: &RawValue, n: i64) -> RawValue {
        match self {
            Interval::Number(step) => value.with_number(offset_number(value.to_f64(), *step, n)),
            Interval::Time(t) => match value.as_date() {
                Some(d) => RawValue::Date(t.offset(d, n)),
                None => value.with_number(t.offset_ms(value.to_f64(), n)),
            },
        }
    }

    pub fn ceil(&self, value: &RawValue) -> RawValue {
        let floored = self.floor(value);
        if floored.to_f64() == value.to_f64() {
            floored
        } else {
            self.offset(&floored, 1)
        }
    }

    /// Interval boundaries `t` with `start <= t < stop`
    pub fn range(&self, start: &RawValue, stop: &RawValue) -> Vec<RawValue> {
        match self {
            Interval::Time(t) => match (start.as_date(), stop.as_date()) {
                (Some(a), Some(b)) => t.range(a, b).into_iter().map(RawValue::Date).collect(),
                _ => vec![],
            },
            Interval::Number(_) => {
                let stop_f = stop.to_f64();
                let mut out = vec![];
                let mut v = self.ceil(start);
                while v.to_f64() < stop_f {
                    out.push(v.clone());
                    v = self.offset(&v, 1);
                }
                out
            }
        }
    }

    /// Floor on a plain millisecond or numeric scalar
    pub fn floor_f64(&self, x: f64) -> f64 {
        match self {
            Interval::Number(step) => floor_number(x, *step),
            Interval::Time(t) => t.floor_ms(x),
        }
    }

    pub fn offset_f64(&self, x: f64, n: i64) -> f64 {
        match self {
            Interval::Number(step) => offset_number(x, *step, n),
            Interval::Time(t) => t.offset_ms(x, n),
        }
    }
}

// Steps below one floor through their inverse to avoid accumulating error
fn floor_number(x: f64, step: f64) -> f64 {
    if step < 1.0 {
        let inv = (1.0 / step).round();
        (x * inv).floor() / inv
    } else {
        (x / step).floor() * step
    }
}

fn offset_number(x: f64, step: f64, n: i64) -> f64 {
    if step < 1.0 {
        let inv = (1.0 / step).round();
        (x * inv + n as f64) / inv
    } else {
        x + n as f64 * step
    }
}

fn parse_time_unit(name: &str) -> Option<TimeUnit> {
    let singular = match name {
        "ms" => "millisecond",
        other => other.strip_suffix('s').unwrap_or(other),
    };
    TimeUnit::from_str(singular).ok()
}

impl FromStr for Interval {
    type Err = AvengerPlotError;

    /// `"10"`, `"day"`, `"3 days"`, `"1 month"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        if let Some(step) = parse_number(&text) {
            return Interval::number(step).map_err(|_| AvengerPlotError::InvalidInterval(s.into()));
        }
        let caps = INTERVAL_RE
            .captures(&text)
            .ok_or_else(|| AvengerPlotError::InvalidInterval(s.into()))?;
        let step = match caps.get(1) {
            Some(m) => m
                .as_str()
                .parse::<u32>()
                .map_err(|_| AvengerPlotError::InvalidInterval(s.into()))?,
            None => 1,
        };
        if step == 0 {
            return Err(AvengerPlotError::InvalidInterval(s.into()));
        }
        let unit = caps
            .get(2)
            .and_then(|m| parse_time_unit(m.as_str()))
            .ok_or_else(|| AvengerPlotError::InvalidInterval(s.into()))?;
        Ok(Interval::time(unit, step))
    }
}

/// An interval with a direction, e.g. `"+3 days"` or `"-1 week"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedInterval {
    pub interval: Interval,
    pub sign: i64,
}

impl SignedInterval {
    /// Shift by a plain number, which may be negative
    pub fn number(n: f64) -> Self {
        Self {
            interval: Interval::Number(n.abs()),
            sign: if n < 0.0 { -1 } else { 1 },
        }
    }

    pub fn apply(&self, value: &RawValue) -> RawValue {
        match self.interval {
            Interval::Number(step) => value.with_number(value.to_f64() + self.sign as f64 * step),
            interval => interval.offset(value, self.sign),
        }
    }
}

impl FromStr for SignedInterval {
    type Err = AvengerPlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (sign, rest) = match SIGNED_RE.captures(text) {
            Some(caps) => {
                let sign = if caps.get(1).map(|m| m.as_str()) == Some("-") {
                    -1
                } else {
                    1
                };
                (sign, caps.get(2).map(|m| m.as_str()).unwrap_or_default())
            }
            None => (1, text),
        };
        let interval = rest
            .parse::<Interval>()
            .map_err(|_| AvengerPlotError::InvalidInterval(s.into()))?;
        Ok(Self { interval, sign })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    #[rstest]
    #[case("day", Interval::time(TimeUnit::Day, 1))]
    #[case("3 days", Interval::time(TimeUnit::Day, 3))]
    #[case("1 Month", Interval::time(TimeUnit::Month, 1))]
    #[case("2 weeks", Interval::time(TimeUnit::Week, 2))]
    #[case("ms", Interval::time(TimeUnit::Millisecond, 1))]
    #[case("10", Interval::Number(10.0))]
    fn test_parse(#[case] text: &str, #[case] expected: Interval) {
        assert_eq!(text.parse::<Interval>().unwrap(), expected);
    }

    #[rstest]
    #[case("fortnight")]
    #[case("0 days")]
    #[case("-5")]
    #[case("")]
    fn test_parse_invalid(#[case] text: &str) {
        assert!(matches!(
            text.parse::<Interval>(),
            Err(AvengerPlotError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_number_floor_and_offset() {
        let interval = Interval::Number(5.0);
        assert_eq!(interval.floor(&RawValue::from(12.0)), RawValue::from(10.0));
        assert_eq!(interval.offset(&RawValue::from(10.0), 1), RawValue::from(15.0));
        assert_eq!(interval.ceil(&RawValue::from(11.0)), RawValue::from(15.0));
        let small = Interval::Number(0.1);
        assert_eq!(small.floor(&RawValue::from(0.37)), RawValue::from(0.3));
    }

    #[test]
    fn test_time_floor_keeps_dates() {
        let interval: Interval = "month".parse().unwrap();
        let d = Utc.with_ymd_and_hms(2021, 5, 17, 8, 0, 0).unwrap();
        assert_eq!(
            interval.floor(&RawValue::from(d)),
            RawValue::from(Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_signed() {
        let d = Utc.with_ymd_and_hms(2021, 5, 17, 0, 0, 0).unwrap();
        let plus: SignedInterval = "+3 days".parse().unwrap();
        assert_eq!(
            plus.apply(&RawValue::from(d)),
            RawValue::from(Utc.with_ymd_and_hms(2021, 5, 20, 0, 0, 0).unwrap())
        );
        let minus: SignedInterval = "-1 week".parse().unwrap();
        assert_eq!(
            minus.apply(&RawValue::from(d)),
            RawValue::from(Utc.with_ymd_and_hms(2021, 5, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(
            SignedInterval::number(-2.0).apply(&RawValue::from(5.0)),
            RawValue::from(3.0)
        );
        assert!("+3 eons".parse::<SignedInterval>().is_err());
    }
}
