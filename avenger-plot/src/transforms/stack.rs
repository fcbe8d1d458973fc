//! Stack transform for creating stacked visualizations

use std::collections::HashMap;

use indexmap::IndexMap;
use strum::{Display, EnumString, VariantNames};

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::reduce::number_or_null;
use crate::transforms::grouping::{group_facets, z_channel, GroupingOptions};
use crate::transforms::{with_synthetic_column, Axis, DataContext, Transform};
use crate::value::{compare_defined, GroupKey, RawValue};

/// Ordering of series within each stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum StackOrder {
    /// Input order
    #[default]
    None,
    /// Ascending series total
    Sum,
    /// By the position of each series' maximum value
    Appearance,
    /// Largest series in the middle, alternating outwards
    InsideOut,
}

/// Baseline of each stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum StackOffset {
    /// Stack from zero
    #[default]
    None,
    /// Rescale every stack to `[0, 1]`
    Normalize,
    /// Center stacks around their midpoint (silhouette)
    Center,
    /// Minimize change in slope between stacks (streamgraph)
    Wiggle,
}

/// Convert one positional channel into `[low, high]` pairs by stacking the
/// rows that share a value on the other axis.
///
/// Positive and negative values stack separately. Series are keyed by `z`,
/// else `fill`, else `stroke`. Writes `__y1`, `__y2` and the midpoint `__y`
/// (or the x equivalents); rows with invalid values get nulls.
#[derive(Debug, Clone)]
pub struct Stack {
    axis: Axis,
    order: Option<StackOrder>,
    offset: StackOffset,
    reverse: bool,
}

impl Stack {
    fn new(axis: Axis) -> Self {
        Self {
            axis,
            order: None,
            offset: StackOffset::None,
            reverse: false,
        }
    }

    /// Stack y values within x groups
    pub fn y() -> Self {
        Self::new(Axis::Y)
    }

    /// Stack x values within y groups
    pub fn x() -> Self {
        Self::new(Axis::X)
    }

    pub fn order(mut self, order: StackOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Wiggle defaults the order to inside-out unless one is set
    pub fn offset(mut self, offset: StackOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    fn effective_order(&self) -> StackOrder {
        match (self.order, self.offset) {
            (Some(order), _) => order,
            (None, StackOffset::Wiggle) => StackOrder::InsideOut,
            (None, _) => StackOrder::None,
        }
    }
}

impl Transform for Stack {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let [value_channel, lo_channel, hi_channel] = self.axis.channels();
        let [key_channel, ..] = self.axis.other().channels();
        let n = ctx.data().len();

        // Without a value channel every row counts as one
        let values: Vec<f64> = if ctx.has_channel(value_channel) {
            ctx.column(value_channel)?.iter().map(RawValue::to_f64).collect()
        } else {
            vec![1.0; n]
        };
        let keys = if ctx.has_channel(key_channel) {
            ctx.column(key_channel)?
        } else {
            vec![RawValue::Null; n]
        };
        let series: Option<Vec<GroupKey>> = match z_channel(&ctx, &[]) {
            Some(z) => Some(ctx.column(z)?.iter().map(GroupKey::from).collect()),
            None => None,
        };

        let mut y1 = vec![f64::NAN; n];
        let mut y2 = vec![f64::NAN; n];
        let order = self.effective_order();
        for facet in group_facets(&ctx, &GroupingOptions::facets_only())? {
            let rank = series.as_ref().and_then(|series| {
                series_rank(order, &facet.indices, &keys, &values, series)
            });

            let mut by_key: IndexMap<GroupKey, (RawValue, Vec<usize>)> = IndexMap::new();
            for &i in &facet.indices {
                by_key
                    .entry(GroupKey::from(&keys[i]))
                    .or_insert_with(|| (keys[i].clone(), vec![]))
                    .1
                    .push(i);
            }
            let mut stacks: Vec<(RawValue, Vec<usize>)> = by_key.into_values().collect();

            for (_, stack) in stacks.iter_mut() {
                if let (Some(rank), Some(series)) = (&rank, &series) {
                    stack.sort_by_key(|i| rank.get(&series[*i]).copied().unwrap_or(usize::MAX));
                }
                if self.reverse {
                    stack.reverse();
                }
                let (mut yn, mut yp) = (0.0, 0.0);
                for &i in stack.iter() {
                    let v = values[i];
                    if !v.is_finite() {
                        continue;
                    }
                    if v < 0.0 {
                        y1[i] = yn;
                        yn += v;
                        y2[i] = yn;
                    } else {
                        y1[i] = yp;
                        yp += v;
                        y2[i] = yp;
                    }
                }
            }

            match self.offset {
                StackOffset::None => {}
                StackOffset::Normalize => offset_normalize(&stacks, &mut y1, &mut y2),
                StackOffset::Center => offset_center(&stacks, &mut y1, &mut y2),
                StackOffset::Wiggle => {
                    stacks.sort_by(|a, b| compare_defined(&a.0, &b.0));
                    offset_wiggle(&stacks, &mut y1, &mut y2, series.as_deref());
                }
            }
        }

        let mid: Vec<RawValue> = y1
            .iter()
            .zip(&y2)
            .map(|(a, b)| number_or_null((a + b) / 2.0))
            .collect();
        let lo: Vec<RawValue> = y1.into_iter().map(number_or_null).collect();
        let hi: Vec<RawValue> = y2.into_iter().map(number_or_null).collect();

        let (data, channels, insets) = ctx.into_parts();
        let data = with_synthetic_column(data, &lo_channel.to_string(), lo);
        let data = with_synthetic_column(data, &hi_channel.to_string(), hi);
        let data = with_synthetic_column(data, &value_channel.to_string(), mid);

        let mut out = DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets);
        for channel in [value_channel, lo_channel, hi_channel] {
            out = out.with_synthetic_channel(channel, &channel.to_string());
        }
        Ok(out)
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.axis.channels().to_vec()
    }
}

/// Rank of each series in stacking order, `None` to keep input order
fn series_rank(
    order: StackOrder,
    indices: &[usize],
    keys: &[RawValue],
    values: &[f64],
    series: &[GroupKey],
) -> Option<HashMap<GroupKey, usize>> {
    // Per series: total and the key at its maximum value, in first-seen order
    let mut stats: IndexMap<&GroupKey, (f64, f64, &RawValue)> = IndexMap::new();
    for &i in indices {
        let v = values[i];
        let entry = stats
            .entry(&series[i])
            .or_insert((0.0, f64::NEG_INFINITY, &RawValue::Null));
        if v.is_finite() {
            entry.0 += v;
            if v > entry.1 {
                entry.1 = v;
                entry.2 = &keys[i];
            }
        }
    }

    let mut ordered: Vec<(&GroupKey, (f64, f64, &RawValue))> = stats.into_iter().collect();
    match order {
        StackOrder::None => return None,
        StackOrder::Sum => ordered.sort_by(|a, b| a.1 .0.total_cmp(&b.1 .0)),
        StackOrder::Appearance => ordered.sort_by(|a, b| compare_defined(a.1 .2, b.1 .2)),
        StackOrder::InsideOut => {
            ordered.sort_by(|a, b| compare_defined(a.1 .2, b.1 .2));
            let (mut below, mut above) = (vec![], vec![]);
            let mut balance = 0.0;
            for entry in ordered {
                if balance < 0.0 {
                    balance += entry.1 .0;
                    above.push(entry);
                } else {
                    balance -= entry.1 .0;
                    below.push(entry);
                }
            }
            below.reverse();
            below.extend(above);
            ordered = below;
        }
    }
    Some(
        ordered
            .into_iter()
            .enumerate()
            .map(|(rank, (key, _))| (key.clone(), rank))
            .collect(),
    )
}

fn stack_extent(stack: &[usize], y1: &[f64], y2: &[f64]) -> (f64, f64) {
    stack
        .iter()
        .flat_map(|i| [y1[*i], y2[*i]])
        .filter(|v| v.is_finite())
        .fold((0.0, 0.0), |(lo, hi): (f64, f64), v| (lo.min(v), hi.max(v)))
}

fn offset_normalize(stacks: &[(RawValue, Vec<usize>)], y1: &mut [f64], y2: &mut [f64]) {
    for (_, stack) in stacks {
        let (lo, hi) = stack_extent(stack, y1, y2);
        let span = if hi - lo != 0.0 { hi - lo } else { 1.0 };
        for &i in stack {
            y1[i] = (y1[i] - lo) / span;
            y2[i] = (y2[i] - lo) / span;
        }
    }
}

fn offset_center(stacks: &[(RawValue, Vec<usize>)], y1: &mut [f64], y2: &mut [f64]) {
    for (_, stack) in stacks {
        let (lo, hi) = stack_extent(stack, y1, y2);
        let mid = lo + (hi - lo) / 2.0;
        for &i in stack {
            y1[i] -= mid;
            y2[i] -= mid;
        }
    }
    offset_zero(stacks, y1, y2);
}

/// Streamgraph baseline after Byron and Wattenberg
fn offset_wiggle(
    stacks: &[(RawValue, Vec<usize>)],
    y1: &mut [f64],
    y2: &mut [f64],
    series: Option<&[GroupKey]>,
) {
    let mut prev: HashMap<GroupKey, f64> = HashMap::new();
    let mut baseline = 0.0;
    for (_, stack) in stacks {
        let mut weights = Vec::with_capacity(stack.len());
        let mut diffs = Vec::with_capacity(stack.len());
        for (j, &i) in stack.iter().enumerate() {
            let value = y2[i] - y1[i];
            let value = if value.is_finite() { value } else { 0.0 };
            let key = match series {
                Some(series) => series[i].clone(),
                None => GroupKey::Number((j as f64).into()),
            };
            let diff = prev.get(&key).map(|p| value - p).unwrap_or(0.0);
            prev.insert(key, value);
            weights.push(value.abs());
            diffs.push(diff);
        }
        for &i in stack {
            y1[i] += baseline;
            y2[i] += baseline;
        }
        let total: f64 = weights.iter().sum();
        if total != 0.0 {
            let mut cumulative = 0.0;
            let mut weighted = 0.0;
            for (w, d) in weights.iter().zip(&diffs) {
                weighted += (d / 2.0 + cumulative) * w;
                cumulative += d;
            }
            baseline -= weighted / total;
        }
    }
    offset_zero(stacks, y1, y2);
}

/// Shift a facet's stacks so the lowest value sits at zero
fn offset_zero(stacks: &[(RawValue, Vec<usize>)], y1: &mut [f64], y2: &mut [f64]) {
    let min = stacks
        .iter()
        .flat_map(|(_, s)| s.iter())
        .map(|i| y1[*i].min(y2[*i]))
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        for (_, stack) in stacks {
            for &i in stack {
                y1[i] -= min;
                y2[i] -= min;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::value::Datum;
    use float_cmp::assert_approx_eq;

    fn ctx() -> DataContext {
        DataContext::new(vec![
            record!("x" => "a", "s" => "u", "v" => 1.0),
            record!("x" => "a", "s" => "v", "v" => 2.0),
            record!("x" => "a", "s" => "w", "v" => 3.0),
            record!("x" => "b", "s" => "u", "v" => 4.0),
            record!("x" => "b", "s" => "w", "v" => 1.0),
        ])
        .with_channel(Channel::X, "x")
        .with_channel(Channel::Y, "v")
        .with_channel(Channel::Z, "s")
    }

    fn field(d: &Datum, name: &str) -> f64 {
        d.field(name).map(RawValue::to_f64).unwrap_or(f64::NAN)
    }

    #[test]
    fn test_stack_y_intervals() {
        let out = Stack::y().transform(ctx()).unwrap();
        let pairs: Vec<(f64, f64)> = out
            .data()
            .iter()
            .map(|d| (field(d, "__y1"), field(d, "__y2")))
            .collect();
        assert_eq!(
            pairs,
            vec![(0.0, 1.0), (1.0, 3.0), (3.0, 6.0), (0.0, 4.0), (4.0, 5.0)]
        );
        assert_eq!(out.channel(Channel::Y1).unwrap().as_field(), Some("__y1"));
        assert_approx_eq!(f64, field(&out.data()[1], "__y"), 2.0);
    }

    #[test]
    fn test_negative_values_stack_down() {
        let ctx = DataContext::new(vec![
            record!("v" => 2.0),
            record!("v" => -1.0),
            record!("v" => -2.0),
        ])
        .with_channel(Channel::Y, "v");
        let out = Stack::y().transform(ctx).unwrap();
        assert_eq!(field(&out.data()[1], "__y1"), 0.0);
        assert_eq!(field(&out.data()[2], "__y1"), -1.0);
        assert_eq!(field(&out.data()[2], "__y2"), -3.0);
    }

    #[test]
    fn test_sum_order() {
        let out = Stack::y()
            .order(StackOrder::Sum)
            .transform(ctx())
            .unwrap();
        // v (2) < w (4) < u (5)
        assert_eq!(field(&out.data()[1], "__y1"), 0.0);
        assert_eq!(field(&out.data()[2], "__y1"), 2.0);
        assert_eq!(field(&out.data()[0], "__y1"), 5.0);
    }

    #[test]
    fn test_null_values_produce_nulls() {
        let ctx = DataContext::new(vec![record!("v" => RawValue::Null), record!("v" => 1.0)])
            .with_channel(Channel::Y, "v");
        let out = Stack::y().transform(ctx).unwrap();
        assert_eq!(out.data()[0].field("__y1"), Some(&RawValue::Null));
        assert_eq!(field(&out.data()[1], "__y1"), 0.0);
    }

    #[test]
    fn test_wiggle_and_center_start_at_zero() {
        for offset in [StackOffset::Wiggle, StackOffset::Center] {
            let out = Stack::y().offset(offset).transform(ctx()).unwrap();
            let min = out
                .data()
                .iter()
                .map(|d| field(d, "__y1").min(field(d, "__y2")))
                .fold(f64::INFINITY, f64::min);
            assert_approx_eq!(f64, min, 0.0);
        }
    }

    #[test]
    fn test_order_names() {
        assert_eq!("inside-out".parse::<StackOrder>().unwrap(), StackOrder::InsideOut);
        assert_eq!(StackOffset::Normalize.to_string(), "normalize");
    }
}
