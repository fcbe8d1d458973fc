//! Histogram binning along one or both positional axes.

use std::str::FromStr;

use avenger_scales::array::{
    bisect_right, extent, nice, quantile_sorted, tick_increment, ticks,
};
use avenger_scales::time::tick_interval;
use indexmap::IndexMap;

use crate::channel::Channel;
use crate::classify::{classify_column, ColumnType};
use crate::error::AvengerPlotError;
use crate::interval::Interval;
use crate::reduce::Reducer;
use crate::transforms::group::output_channels;
use crate::transforms::grouping::{group_facets, key_channels, GroupingOptions};
use crate::transforms::{synthetic_key, Axis, DataContext, Transform};
use crate::value::{DataRecord, Datum, RawValue};

/// Upper bound on the automatic bin count
const MAX_AUTO_BINS: usize = 200;

/// How bin thresholds are chosen
#[derive(Debug, Clone, PartialEq)]
pub enum Thresholds {
    /// Scott's rule capped at 200 bins
    Auto,
    Scott,
    Sturges,
    FreedmanDiaconis,
    /// Approximate number of bins
    Count(usize),
    /// Explicit inner thresholds
    Values(Vec<f64>),
    Interval(Interval),
}

impl FromStr for Thresholds {
    type Err = AvengerPlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Thresholds::Auto),
            "scott" => Ok(Thresholds::Scott),
            "sturges" => Ok(Thresholds::Sturges),
            "freedman-diaconis" | "fd" => Ok(Thresholds::FreedmanDiaconis),
            other => match other.parse::<usize>() {
                Ok(n) => Ok(Thresholds::Count(n)),
                Err(_) => Ok(Thresholds::Interval(s.parse()?)),
            },
        }
    }
}

impl Thresholds {
    fn count(&self, nums: &[f64], min: f64, max: f64) -> Option<usize> {
        let n = nums.len() as f64;
        let count = match self {
            Thresholds::Auto => threshold_scott(nums, min, max).min(MAX_AUTO_BINS),
            Thresholds::Scott => threshold_scott(nums, min, max),
            Thresholds::Sturges => {
                if nums.is_empty() {
                    1
                } else {
                    (n.log2().ceil() as usize + 1).max(1)
                }
            }
            Thresholds::FreedmanDiaconis => {
                let mut sorted = nums.to_vec();
                sorted.sort_by(f64::total_cmp);
                let q = |p| quantile_sorted(&sorted, p);
                let iqr = match (q(0.75), q(0.25)) {
                    (Some(hi), Some(lo)) => hi - lo,
                    _ => 0.0,
                };
                if n > 0.0 && iqr > 0.0 {
                    ((max - min) / (2.0 * iqr * n.powf(-1.0 / 3.0))).ceil() as usize
                } else {
                    1
                }
            }
            Thresholds::Count(n) => *n,
            Thresholds::Values(_) | Thresholds::Interval(_) => return None,
        };
        Some(count.max(1))
    }
}

fn threshold_scott(nums: &[f64], min: f64, max: f64) -> usize {
    let n = nums.len() as f64;
    if nums.len() < 2 {
        return 1;
    }
    let mean = nums.iter().sum::<f64>() / n;
    let deviation = (nums.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    if deviation > 0.0 {
        ((max - min) * n.cbrt() / (3.49 * deviation)).ceil() as usize
    } else {
        1
    }
}

/// Bin edges over a column and the bin each row falls in
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    /// `len() + 1` ascending edges
    pub edges: Vec<f64>,
    /// Bin index per input value, `None` for invalid or out of domain values
    pub assignments: Vec<Option<usize>>,
    pub temporal: bool,
}

impl BinEdges {
    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.len()];
        for i in self.assignments.iter().flatten() {
            counts[*i] += 1;
        }
        counts
    }

    fn edge_value(&self, x: f64) -> RawValue {
        if self.temporal {
            RawValue::from_ms(x)
        } else {
            RawValue::Number(x)
        }
    }
}

/// Compute bins over a column. Follows d3's binning: count based
/// thresholds are niced tick values, values are assigned to
/// `[edge_i, edge_i+1)` with the last bin closed.
pub fn bin_values(
    values: &[RawValue],
    thresholds: &Thresholds,
    domain: Option<[f64; 2]>,
) -> BinEdges {
    let temporal = classify_column(values) == ColumnType::Date;
    let xs: Vec<f64> = values
        .iter()
        .map(|v| match (temporal, v.as_date()) {
            (true, Some(d)) => d.timestamp_millis() as f64,
            _ => v.to_f64(),
        })
        .collect();
    let nums: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();

    let empty = BinEdges {
        edges: vec![],
        assignments: vec![None; values.len()],
        temporal,
    };
    let (min, max) = match (domain, extent(nums.iter().copied())) {
        (Some([a, b]), _) => (a.min(b), a.max(b)),
        (None, Some(e)) => e,
        (None, None) => return empty,
    };

    let interval = match thresholds {
        Thresholds::Interval(interval) => Some(*interval),
        _ if temporal => thresholds
            .count(&nums, min, max)
            .map(|n| Interval::Time(tick_interval(min, max, n as f64))),
        _ => None,
    };
    if let Some(interval) = interval {
        return bin_by_interval(&xs, interval, min, max, temporal);
    }

    let (mut x0, mut x1) = (min, max);
    let mut step = f64::NAN;
    let mut tz: Vec<f64> = match thresholds {
        Thresholds::Values(values) => {
            let mut tz: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
            tz.sort_by(f64::total_cmp);
            tz
        }
        _ => {
            let tn = thresholds.count(&nums, min, max).unwrap_or(1) as f64;
            if x0 == x1 {
                vec![]
            } else {
                if domain.is_none() {
                    (x0, x1) = nice(x0, x1, tn);
                }
                let mut tz = ticks(x0, x1, tn);
                if tz.first().is_some_and(|t| *t <= x0) {
                    step = tick_increment(x0, x1, tn);
                }
                if tz.last().is_some_and(|t| *t >= x1) {
                    // Extend by one tick so the last bin keeps a uniform width
                    if max >= x1 && domain.is_none() {
                        let inc = tick_increment(x0, x1, tn);
                        if inc.is_finite() && inc > 0.0 {
                            x1 = ((x1 / inc).floor() + 1.0) * inc;
                        } else if inc.is_finite() && inc < 0.0 {
                            x1 = ((x1 * -inc).ceil() + 1.0) / -inc;
                        }
                    } else {
                        tz.pop();
                    }
                }
                tz
            }
        }
    };

    // Drop thresholds outside the domain
    let a = tz.iter().take_while(|t| **t <= x0).count();
    let b = tz.len() - tz.iter().rev().take_while(|t| **t > x1).count();
    tz = if a < b { tz[a..b].to_vec() } else { vec![] };
    let m = tz.len();

    let assignments = xs
        .iter()
        .map(|&x| {
            if !(x.is_finite() && x0 <= x && x <= x1) {
                return None;
            }
            let j = if step.is_finite() && step > 0.0 {
                ((x - x0) / step).floor() as usize
            } else if step.is_finite() && step < 0.0 {
                let j = ((x0 - x) * step).floor() as usize;
                j + usize::from(tz.get(j).is_some_and(|t| *t <= x))
            } else {
                bisect_right(&tz, x)
            };
            Some(j.min(m))
        })
        .collect();

    let mut edges = Vec::with_capacity(m + 2);
    edges.push(x0);
    edges.extend(tz);
    edges.push(x1);
    BinEdges {
        edges,
        assignments,
        temporal,
    }
}

fn bin_by_interval(
    xs: &[f64],
    interval: Interval,
    min: f64,
    max: f64,
    temporal: bool,
) -> BinEdges {
    let lo = interval.floor_f64(min);
    let hi = interval.offset_f64(interval.floor_f64(max), 1);
    let mut edges = vec![lo];
    let mut t = lo;
    while t < hi {
        let next = interval.offset_f64(t, 1);
        if !(next > t) {
            break;
        }
        edges.push(next);
        t = next;
    }
    let last = edges.len().saturating_sub(2);
    let assignments = xs
        .iter()
        .map(|&x| {
            (x.is_finite() && lo <= x && x <= hi)
                .then(|| bisect_right(&edges, x).saturating_sub(1).min(last))
        })
        .collect();
    BinEdges {
        edges,
        assignments,
        temporal,
    }
}

/// Bin rows along `x`, `y` or both and reduce each bin.
///
/// Bin edges are written to `__x1`/`__x2` and the midpoint to `__x` (or the
/// y equivalents). Thresholds are computed once over the whole dataset, so
/// every facet and series shares the same grid. Empty bins are omitted.
#[derive(Debug, Clone)]
pub struct Bin {
    axes: Vec<Axis>,
    thresholds: Thresholds,
    domain: Option<[f64; 2]>,
    outputs: IndexMap<Channel, Reducer>,
    cumulative: i8,
    reverse: bool,
}

impl Bin {
    fn new(axes: Vec<Axis>) -> Self {
        Self {
            axes,
            thresholds: Thresholds::Auto,
            domain: None,
            outputs: IndexMap::new(),
            cumulative: 0,
            reverse: false,
        }
    }

    pub fn x() -> Self {
        Self::new(vec![Axis::X])
    }

    pub fn y() -> Self {
        Self::new(vec![Axis::Y])
    }

    pub fn xy() -> Self {
        Self::new(vec![Axis::X, Axis::Y])
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn interval(self, interval: Interval) -> Self {
        self.thresholds(Thresholds::Interval(interval))
    }

    pub fn domain(mut self, domain: [f64; 2]) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Positive accumulates forward, negative accumulates from the last bin
    pub fn cumulative(mut self, cumulative: i8) -> Self {
        self.cumulative = cumulative.signum();
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn output(mut self, channel: Channel, reducer: Reducer) -> Self {
        self.outputs.insert(channel, reducer);
        self
    }

    pub fn reduce(self, channel: Channel, reducer: &str) -> Result<Self, AvengerPlotError> {
        Ok(self.output(channel, Reducer::from_name(reducer)?))
    }

    fn binned_channels(&self) -> Vec<Channel> {
        self.axes.iter().flat_map(|a| a.channels()).collect()
    }

    fn input_channel(&self, ctx: &DataContext, channel: Channel) -> Option<Channel> {
        let binned = self.binned_channels();
        let primary = match channel {
            Channel::X1 | Channel::X2 => Channel::X,
            Channel::Y1 | Channel::Y2 => Channel::Y,
            other => other,
        };
        [channel, primary]
            .into_iter()
            .find(|c| ctx.has_channel(*c) && !binned.contains(c))
    }
}

impl Transform for Bin {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let mut bins = Vec::with_capacity(self.axes.len());
        for axis in &self.axes {
            let [primary, ..] = axis.channels();
            if !ctx.has_channel(primary) {
                return Err(AvengerPlotError::MissingChannel {
                    channel: primary.to_string(),
                    context: "bin".to_string(),
                });
            }
            bins.push(bin_values(&ctx.column(primary)?, &self.thresholds, self.domain));
        }

        let mut inputs: IndexMap<Channel, Option<Vec<RawValue>>> = IndexMap::new();
        for (channel, reducer) in &self.outputs {
            let column = if reducer.needs_input() {
                let input = self.input_channel(&ctx, *channel).ok_or_else(|| {
                    AvengerPlotError::MissingChannel {
                        channel: channel.to_string(),
                        context: format!("the {} reducer", reducer.name()),
                    }
                })?;
                Some(ctx.column(input)?)
            } else {
                None
            };
            inputs.insert(*channel, column);
        }

        let mut exclude = self.binned_channels();
        exclude.extend(self.outputs.keys().copied());
        let options = GroupingOptions::facets_and_z().excluding(&exclude);
        let facet_keys = key_channels(&ctx, &options);

        let mut rows = Vec::new();
        for facet in group_facets(&ctx, &options)? {
            // Members per bin cell, in first-seen order
            let mut cells: IndexMap<Vec<usize>, Vec<usize>> = IndexMap::new();
            if bins.len() == 1 {
                for j in 0..bins[0].len() {
                    cells.insert(vec![j], vec![]);
                }
            }
            for &i in &facet.indices {
                let cell: Option<Vec<usize>> = bins.iter().map(|b| b.assignments[i]).collect();
                if let Some(cell) = cell {
                    cells.entry(cell).or_default().push(i);
                }
            }
            if bins.len() == 1 {
                accumulate(&mut cells, self.cumulative);
            }

            let mut cell_rows = Vec::new();
            for (cell, members) in cells {
                if members.is_empty() {
                    continue;
                }
                let mut record = DataRecord::new();
                for ((axis, b), j) in self.axes.iter().zip(&bins).zip(&cell) {
                    let [primary, lo_channel, hi_channel] = axis.channels();
                    let (lo, hi) = (b.edges[*j], b.edges[*j + 1]);
                    record.insert(synthetic_key(&lo_channel.to_string()), b.edge_value(lo));
                    record.insert(synthetic_key(&hi_channel.to_string()), b.edge_value(hi));
                    record.insert(
                        synthetic_key(&primary.to_string()),
                        b.edge_value((lo + hi) / 2.0),
                    );
                }
                for (channel, reducer) in &self.outputs {
                    let values: Vec<RawValue> = match &inputs[channel] {
                        Some(column) => members.iter().map(|i| column[*i].clone()).collect(),
                        None => vec![RawValue::Null; members.len()],
                    };
                    let reduced = reducer.reduce(&values);
                    record.insert(synthetic_key(&channel.to_string()), reduced);
                }
                cell_rows.push(facet.annotate(Datum::Record(record)));
            }
            if self.reverse {
                cell_rows.reverse();
            }
            rows.extend(cell_rows);
        }

        let derived = self.output_channels();
        let channels = output_channels(ctx.channels(), derived.iter(), &facet_keys);
        let mut insets = ctx.insets();
        for axis in &self.axes {
            match axis {
                Axis::X => {
                    insets.left = insets.left.max(0.5);
                    insets.right = insets.right.max(0.5);
                }
                Axis::Y => {
                    insets.top = insets.top.max(0.5);
                    insets.bottom = insets.bottom.max(0.5);
                }
            }
        }
        Ok(ctx
            .with_data(rows)
            .with_channels(channels)
            .with_insets(insets))
    }

    fn output_channels(&self) -> Vec<Channel> {
        let mut channels = self.binned_channels();
        channels.extend(self.outputs.keys().copied());
        channels
    }
}

/// Fold each 1-D bin's members into its successors (or predecessors when
/// accumulating in reverse)
fn accumulate(cells: &mut IndexMap<Vec<usize>, Vec<usize>>, cumulative: i8) {
    if cumulative == 0 {
        return;
    }
    cells.sort_keys();
    let mut running: Vec<usize> = Vec::new();
    let mut fold = |members: &mut Vec<usize>| {
        running.extend(members.iter().copied());
        *members = running.clone();
    };
    if cumulative > 0 {
        cells.values_mut().for_each(|m| fold(m));
    } else {
        cells.values_mut().rev().for_each(|m| fold(m));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn values(xs: &[f64]) -> Vec<RawValue> {
        xs.iter().map(|x| RawValue::from(*x)).collect()
    }

    #[test]
    fn test_auto_fixture() {
        let bins = bin_values(&values(&[1.0, 2.0, 3.0, 4.0, 5.0]), &Thresholds::Auto, None);
        assert_eq!(bins.edges, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(bins.counts(), vec![1, 2, 2]);
    }

    #[rstest]
    #[case(Thresholds::Auto)]
    #[case(Thresholds::Scott)]
    #[case(Thresholds::Sturges)]
    #[case(Thresholds::FreedmanDiaconis)]
    #[case(Thresholds::Count(7))]
    fn test_every_value_in_one_bin(#[case] thresholds: Thresholds) {
        let xs: Vec<f64> = (0..97).map(|i| ((i * 37) % 101) as f64 * 0.25 - 4.0).collect();
        let bins = bin_values(&values(&xs), &thresholds, None);
        assert!(bins.edges.windows(2).all(|w| w[0] <= w[1]));
        for (x, j) in xs.iter().zip(&bins.assignments) {
            let j = j.expect("value should be binned");
            assert!(bins.edges[j] <= *x);
            if j + 1 < bins.len() {
                assert!(*x < bins.edges[j + 1]);
            } else {
                assert!(*x <= bins.edges[j + 1]);
            }
        }
        assert_eq!(bins.counts().iter().sum::<usize>(), xs.len());
    }

    #[test]
    fn test_explicit_thresholds() {
        let bins = bin_values(
            &values(&[0.0, 1.0, 5.0, 9.0, 10.0]),
            &Thresholds::Values(vec![5.0]),
            None,
        );
        assert_eq!(bins.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(bins.counts(), vec![2, 3]);
    }

    #[test]
    fn test_interval_thresholds() {
        let bins = bin_values(
            &values(&[0.5, 3.0, 9.9]),
            &Thresholds::Interval(Interval::Number(5.0)),
            None,
        );
        assert_eq!(bins.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(bins.counts(), vec![2, 1]);
    }

    #[test]
    fn test_bin_x_transform() {
        let ctx = DataContext::new((1..=5).map(|x| record!("x" => x)).collect())
            .with_channel(Channel::X, "x");
        let out = Bin::x()
            .output(Channel::Y, Reducer::Count)
            .transform(ctx)
            .unwrap();
        let counts: Vec<f64> = out
            .data()
            .iter()
            .map(|d| d.field("__y").map(RawValue::to_f64).unwrap_or(f64::NAN))
            .collect();
        assert_eq!(counts, vec![1.0, 2.0, 2.0]);
        assert_eq!(out.data()[0].field("__x1"), Some(&RawValue::from(0.0)));
        assert_eq!(out.data()[0].field("__x2"), Some(&RawValue::from(2.0)));
        assert_eq!(out.data()[0].field("__x"), Some(&RawValue::from(1.0)));
        assert_approx_eq!(f64, out.insets().left, 0.5);
        assert_eq!(out.channel(Channel::X1).unwrap().as_field(), Some("__x1"));
    }

    #[test]
    fn test_cumulative_and_reverse() {
        let ctx = DataContext::new((1..=5).map(|x| record!("x" => x)).collect())
            .with_channel(Channel::X, "x");
        let counts = |bin: Bin| -> Vec<f64> {
            bin.output(Channel::Y, Reducer::Count)
                .transform(ctx.clone())
                .unwrap()
                .data()
                .iter()
                .map(|d| d.field("__y").map(RawValue::to_f64).unwrap_or(f64::NAN))
                .collect()
        };
        assert_eq!(counts(Bin::x().cumulative(1)), vec![1.0, 3.0, 5.0]);
        assert_eq!(counts(Bin::x().cumulative(-1)), vec![5.0, 4.0, 2.0]);
        assert_eq!(counts(Bin::x().reverse(true)), vec![2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_bin_xy_shares_grid() {
        let ctx = DataContext::new(vec![
            record!("a" => 1, "b" => 1),
            record!("a" => 1, "b" => 9),
            record!("a" => 9, "b" => 9),
            record!("a" => 9, "b" => 9),
        ])
        .with_channel(Channel::X, "a")
        .with_channel(Channel::Y, "b");
        let out = Bin::xy()
            .thresholds(Thresholds::Values(vec![5.0]))
            .output(Channel::Fill, Reducer::Count)
            .transform(ctx)
            .unwrap();
        assert_eq!(out.data().len(), 3);
        assert_eq!(out.data()[2].field("__fill"), Some(&RawValue::from(2)));
        assert_eq!(out.data()[2].field("__y1"), Some(&RawValue::from(5.0)));
    }
}
