//! Named aggregate functions used by group, bin and window transforms.

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use avenger_scales::array::quantile_sorted;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use strum::{EnumString, IntoStaticStr};

use crate::error::AvengerPlotError;
use crate::value::{compare_defined, GroupKey, RawValue};

lazy_static! {
    static ref PERCENTILE_RE: Regex = Regex::new(r"^p(\d{2})$").unwrap();
}

pub type ReduceFn = Arc<dyn Fn(&[RawValue]) -> RawValue + Send + Sync>;

/// Aggregates a group's resolved values into one value. Null and NaN inputs
/// are ignored by the numeric reducers.
///
/// `FromStr` knows the fixed names only; [`Reducer::from_name`] also accepts
/// `pXX` percentiles.
#[derive(Clone, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Reducer {
    Count,
    Min,
    Max,
    Mode,
    Sum,
    Mean,
    Median,
    Variance,
    Deviation,
    First,
    Last,
    /// last - first
    Difference,
    /// last / first
    Ratio,
    /// `pXX` percentile, 0 to 99
    #[strum(disabled)]
    Percentile(u8),
    #[strum(disabled)]
    Custom(ReduceFn),
}

impl Reducer {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[RawValue]) -> RawValue + Send + Sync + 'static,
    {
        Reducer::Custom(Arc::new(f))
    }

    /// Whether this reducer reads an input channel. `count` only needs rows.
    pub fn needs_input(&self) -> bool {
        !matches!(self, Reducer::Count)
    }

    pub fn reduce(&self, values: &[RawValue]) -> RawValue {
        match self {
            Reducer::Count => RawValue::Number(values.len() as f64),
            Reducer::Min => defined(values)
                .min_by(|a, b| compare_defined(a, b))
                .cloned()
                .unwrap_or_default(),
            Reducer::Max => defined(values)
                .max_by(|a, b| compare_defined(a, b))
                .cloned()
                .unwrap_or_default(),
            Reducer::Mode => mode(values),
            Reducer::Sum => RawValue::Number(numbers(values).iter().sum()),
            Reducer::Mean => {
                let nums = numbers(values);
                if nums.is_empty() {
                    RawValue::Null
                } else {
                    like_first(values, nums.iter().sum::<f64>() / nums.len() as f64)
                }
            }
            Reducer::Median => percentile(values, 0.5),
            Reducer::Percentile(p) => percentile(values, *p as f64 / 100.0),
            Reducer::Variance => variance(&numbers(values))
                .map(RawValue::Number)
                .unwrap_or_default(),
            Reducer::Deviation => variance(&numbers(values))
                .map(|v| RawValue::Number(v.sqrt()))
                .unwrap_or_default(),
            Reducer::First => values.first().cloned().unwrap_or_default(),
            Reducer::Last => values.last().cloned().unwrap_or_default(),
            Reducer::Difference => match (values.first(), values.last()) {
                (Some(first), Some(last)) => number_or_null(last.to_f64() - first.to_f64()),
                _ => RawValue::Null,
            },
            Reducer::Ratio => match (values.first(), values.last()) {
                (Some(first), Some(last)) => number_or_null(last.to_f64() / first.to_f64()),
                _ => RawValue::Null,
            },
            Reducer::Custom(f) => f(values),
        }
    }
}

fn defined(values: &[RawValue]) -> impl Iterator<Item = &RawValue> {
    values.iter().filter(|v| v.is_defined())
}

/// Finite numeric coercions of the defined values
pub(crate) fn numbers(values: &[RawValue]) -> Vec<f64> {
    values
        .iter()
        .map(RawValue::to_f64)
        .filter(|v| v.is_finite())
        .collect()
}

pub(crate) fn number_or_null(n: f64) -> RawValue {
    if n.is_nan() {
        RawValue::Null
    } else {
        RawValue::Number(n)
    }
}

/// Keep dates as dates when the inputs are dates
fn like_first(values: &[RawValue], n: f64) -> RawValue {
    match defined(values).next() {
        Some(first) => first.with_number(n),
        None => RawValue::Number(n),
    }
}

fn percentile(values: &[RawValue], p: f64) -> RawValue {
    let mut nums = numbers(values);
    nums.sort_by(f64::total_cmp);
    match quantile_sorted(&nums, p) {
        Some(q) => like_first(values, q),
        None => RawValue::Null,
    }
}

/// Sample variance, undefined below two values
fn variance(nums: &[f64]) -> Option<f64> {
    if nums.len() < 2 {
        return None;
    }
    let n = nums.len() as f64;
    let mean = nums.iter().sum::<f64>() / n;
    Some(nums.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0))
}

/// Most frequent defined value, earliest on ties
fn mode(values: &[RawValue]) -> RawValue {
    let mut counts: IndexMap<GroupKey, (usize, &RawValue)> = IndexMap::new();
    for v in defined(values) {
        counts.entry(GroupKey::from(v)).or_insert((0, v)).0 += 1;
    }
    let mut best: Option<(usize, &RawValue)> = None;
    for (count, value) in counts.values() {
        if best.map_or(true, |(c, _)| *count > c) {
            best = Some((*count, value));
        }
    }
    best.map(|(_, v)| v.clone()).unwrap_or_default()
}

impl Debug for Reducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reducer::Custom(_) => write!(f, "Custom(..)"),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl Reducer {
    /// Look up a reducer by name, falling back to the `pXX` percentile family
    pub fn from_name(name: &str) -> Result<Self, AvengerPlotError> {
        if let Ok(reducer) = Reducer::from_str(name) {
            return Ok(reducer);
        }
        PERCENTILE_RE
            .captures(&name.to_ascii_lowercase())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .map(Reducer::Percentile)
            .ok_or_else(|| AvengerPlotError::UnknownReducer(name.to_string()))
    }

    pub fn name(&self) -> String {
        match self {
            Reducer::Percentile(p) => format!("p{p:02}"),
            Reducer::Custom(_) => "custom".into(),
            named => <&'static str>::from(named).to_string(),
        }
    }
}

impl Display for Reducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl PartialEq for Reducer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reducer::Custom(a), Reducer::Custom(b)) => Arc::ptr_eq(a, b),
            (Reducer::Custom(_), _) | (_, Reducer::Custom(_)) => false,
            (a, b) => a.name() == b.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn nums(values: &[f64]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::from(*v)).collect()
    }

    #[rstest]
    #[case("count", 4.0)]
    #[case("sum", 10.0)]
    #[case("mean", 2.5)]
    #[case("median", 2.5)]
    #[case("min", 1.0)]
    #[case("max", 4.0)]
    #[case("first", 4.0)]
    #[case("last", 3.0)]
    #[case("difference", -1.0)]
    #[case("ratio", 0.75)]
    #[case("p25", 1.75)]
    fn test_named_reducers(#[case] name: &str, #[case] expected: f64) {
        let reducer = Reducer::from_name(name).unwrap();
        let values = nums(&[4.0, 1.0, 2.0, 3.0]);
        assert_approx_eq!(f64, reducer.reduce(&values).to_f64(), expected);
    }

    #[test]
    fn test_nulls_are_ignored() {
        let values = vec![
            RawValue::from(1.0),
            RawValue::Null,
            RawValue::Number(f64::NAN),
            RawValue::from(3.0),
        ];
        assert_eq!(Reducer::Sum.reduce(&values), RawValue::from(4.0));
        assert_eq!(Reducer::Mean.reduce(&values), RawValue::from(2.0));
        assert_eq!(Reducer::Min.reduce(&values), RawValue::from(1.0));
        assert_eq!(Reducer::Max.reduce(&values), RawValue::from(3.0));
    }

    #[test]
    fn test_variance_and_deviation() {
        let values = nums(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_approx_eq!(f64, Reducer::Variance.reduce(&values).to_f64(), 32.0 / 7.0);
        assert_approx_eq!(
            f64,
            Reducer::Deviation.reduce(&values).to_f64(),
            (32.0f64 / 7.0).sqrt()
        );
        assert_eq!(Reducer::Variance.reduce(&nums(&[1.0])), RawValue::Null);
    }

    #[test]
    fn test_mode_prefers_first_on_ties() {
        let values = vec![
            RawValue::from("b"),
            RawValue::from("a"),
            RawValue::from("a"),
            RawValue::from("b"),
        ];
        assert_eq!(Reducer::Mode.reduce(&values), RawValue::from("b"));
    }

    #[test]
    fn test_unknown_reducer() {
        assert_eq!(
            Reducer::from_name("p100").unwrap_err(),
            AvengerPlotError::UnknownReducer("p100".to_string())
        );
        assert!(Reducer::from_name("average").is_err());
        assert!(Reducer::from_name("custom").is_err());
        assert_eq!(Reducer::from_name("p90").unwrap(), Reducer::Percentile(90));
        assert_eq!(Reducer::from_name("P05").unwrap(), Reducer::Percentile(5));
    }

    #[rstest]
    #[case("count", Reducer::Count)]
    #[case("Deviation", Reducer::Deviation)]
    #[case("DIFFERENCE", Reducer::Difference)]
    fn test_fixed_names_parse(#[case] name: &str, #[case] expected: Reducer) {
        assert_eq!(name.parse::<Reducer>().unwrap(), expected);
    }

    #[test]
    fn test_names_display() {
        assert_eq!(Reducer::Variance.to_string(), "variance");
        assert_eq!(Reducer::Percentile(5).to_string(), "p05");
        assert_eq!(Reducer::custom(|_| RawValue::Null).name(), "custom");
        assert!("p90".parse::<Reducer>().is_err());
    }
}
