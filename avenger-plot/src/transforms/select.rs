use std::cmp::Ordering;
use std::str::FromStr;

use serde_json::Value;

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::transforms::grouping::{group_facets, GroupingOptions};
use crate::transforms::{DataContext, Transform};
use crate::value::{compare_defined, RawValue};

/// Which row of each series to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    First,
    Last,
    /// Row with the smallest value of a channel
    Min(Channel),
    /// Row with the largest value of a channel
    Max(Channel),
}

impl Selector {
    /// Accepts `"first"`, `"last"` or a single `{"<channel>": "min" | "max"}`
    pub fn from_json(value: &Value) -> Result<Self, AvengerPlotError> {
        match value {
            Value::String(s) => match s.as_str() {
                "first" => Ok(Selector::First),
                "last" => Ok(Selector::Last),
                other => Err(AvengerPlotError::InvalidSelectOption(other.to_string())),
            },
            Value::Object(map) if map.len() == 1 => {
                let (name, order) = map
                    .iter()
                    .next()
                    .ok_or_else(|| AvengerPlotError::InvalidSelectOption(value.to_string()))?;
                let channel = Channel::from_str(name).map_err(|_| {
                    AvengerPlotError::InvalidSelectOption(format!("unknown channel `{name}`"))
                })?;
                match order.as_str() {
                    Some("min") => Ok(Selector::Min(channel)),
                    Some("max") => Ok(Selector::Max(channel)),
                    _ => Err(AvengerPlotError::InvalidSelectOption(format!(
                        "expected min or max, found {order}"
                    ))),
                }
            }
            other => Err(AvengerPlotError::InvalidSelectOption(other.to_string())),
        }
    }

    fn channel(&self) -> Option<Channel> {
        match self {
            Selector::Min(c) | Selector::Max(c) => Some(*c),
            _ => None,
        }
    }
}

/// Keep one row per facet and series
#[derive(Debug, Clone, Copy)]
pub struct Select {
    selector: Selector,
}

impl Select {
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }

    pub fn first() -> Self {
        Self::new(Selector::First)
    }

    pub fn last() -> Self {
        Self::new(Selector::Last)
    }

    pub fn min_x() -> Self {
        Self::new(Selector::Min(Channel::X))
    }

    pub fn max_x() -> Self {
        Self::new(Selector::Max(Channel::X))
    }

    pub fn min_y() -> Self {
        Self::new(Selector::Min(Channel::Y))
    }

    pub fn max_y() -> Self {
        Self::new(Selector::Max(Channel::Y))
    }
}

impl Transform for Select {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let column = match self.selector.channel() {
            Some(channel) => Some(ctx.column(channel)?),
            None => None,
        };
        let exclude: Vec<Channel> = self.selector.channel().into_iter().collect();
        let options = GroupingOptions::facets_and_z().excluding(&exclude);

        let mut selected = Vec::new();
        for group in group_facets(&ctx, &options)? {
            let pick = match (self.selector, &column) {
                (Selector::First, _) => group.indices.first().copied(),
                (Selector::Last, _) => group.indices.last().copied(),
                (Selector::Min(_), Some(values)) => {
                    extreme(&group.indices, |a, b| compare_defined(&values[a], &values[b]), values)
                }
                (Selector::Max(_), Some(values)) => extreme(
                    &group.indices,
                    |a, b| compare_defined(&values[b], &values[a]),
                    values,
                ),
                _ => None,
            };
            selected.extend(pick);
        }
        selected.sort_unstable();

        let data = selected.into_iter().map(|i| ctx.data()[i].clone()).collect();
        Ok(ctx.with_data(data))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![]
    }
}

/// First index ranking lowest under `cmp`, ignoring undefined values
fn extreme(
    indices: &[usize],
    cmp: impl Fn(usize, usize) -> Ordering,
    values: &[RawValue],
) -> Option<usize> {
    indices
        .iter()
        .copied()
        .filter(|i| values[*i].is_defined())
        .fold(None, |best, i| match best {
            Some(b) if cmp(i, b) != Ordering::Less => Some(b),
            _ => Some(i),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use serde_json::json;

    fn ctx() -> DataContext {
        DataContext::new(vec![
            record!("id" => 0, "s" => "a", "v" => 3),
            record!("id" => 1, "s" => "b", "v" => 1),
            record!("id" => 2, "s" => "a", "v" => 1),
            record!("id" => 3, "s" => "a", "v" => 1),
            record!("id" => 4, "s" => "b", "v" => 5),
        ])
        .with_channel(Channel::Y, "v")
        .with_channel(Channel::Z, "s")
    }

    fn ids(ctx: &DataContext) -> Vec<f64> {
        ctx.data()
            .iter()
            .map(|d| d.field("id").map(RawValue::to_f64).unwrap_or(f64::NAN))
            .collect()
    }

    #[test]
    fn test_first_and_last() {
        assert_eq!(ids(&Select::first().transform(ctx()).unwrap()), vec![0.0, 1.0]);
        assert_eq!(ids(&Select::last().transform(ctx()).unwrap()), vec![3.0, 4.0]);
    }

    #[test]
    fn test_min_ties_keep_first() {
        let out = Select::min_y().transform(ctx()).unwrap();
        assert_eq!(ids(&out), vec![1.0, 2.0]);
        let out = Select::max_y().transform(ctx()).unwrap();
        assert_eq!(ids(&out), vec![0.0, 4.0]);
    }

    #[test]
    fn test_selector_from_json() {
        assert_eq!(
            Selector::from_json(&json!({"y": "max"})).unwrap(),
            Selector::Max(Channel::Y)
        );
        assert_eq!(Selector::from_json(&json!("first")).unwrap(), Selector::First);
        assert!(Selector::from_json(&json!({"y": "median"})).is_err());
        assert!(Selector::from_json(&json!({"x": "min", "y": "max"})).is_err());
    }
}
