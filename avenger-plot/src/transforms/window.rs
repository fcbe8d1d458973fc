use std::str::FromStr;

use strum::{Display, EnumString, VariantNames};

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::interval::Interval;
use crate::reduce::Reducer;
use crate::transforms::grouping::{group_facets, GroupingOptions};
use crate::transforms::{with_synthetic_column, Axis, DataContext, Transform};
use crate::value::RawValue;

/// Where the current row sits within its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum WindowAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl WindowAnchor {
    /// Rows before the current one in a window of `k` rows
    fn shift(&self, k: usize) -> usize {
        match self {
            WindowAnchor::Start => 0,
            WindowAnchor::Middle => k.saturating_sub(1) >> 1,
            WindowAnchor::End => k.saturating_sub(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowSize {
    /// `k` consecutive rows
    Count(usize),
    /// Rows whose value on the other axis lies within one interval
    Interval(Interval),
}

impl FromStr for WindowSize {
    type Err = AvengerPlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<usize>() {
            Ok(k) if k > 0 => Ok(WindowSize::Count(k)),
            Ok(_) => Err(AvengerPlotError::InvalidInterval(s.to_string())),
            Err(_) => Ok(WindowSize::Interval(s.parse()?)),
        }
    }
}

/// Window geometry shared by [`Window`] and the bollinger transform
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WindowSpec {
    pub size: WindowSize,
    pub anchor: WindowAnchor,
    /// Minimum number of valid values a window needs to produce output
    pub strict: Option<usize>,
}

impl WindowSpec {
    /// Member positions of each position's window within a group.
    /// `keys` are the group's values on the other axis, needed for
    /// interval windows.
    pub fn windows(&self, keys: &[RawValue]) -> Vec<Vec<usize>> {
        let n = keys.len();
        match &self.size {
            WindowSize::Count(k) => {
                let k = (*k).max(1);
                let shift = self.anchor.shift(k);
                (0..n)
                    .map(|p| {
                        let start = p.saturating_sub(shift);
                        let end = (p + k).saturating_sub(shift).min(n);
                        (start..end).collect()
                    })
                    .collect()
            }
            WindowSize::Interval(interval) => {
                let values: Vec<f64> = keys.iter().map(RawValue::to_f64).collect();
                (0..n)
                    .map(|p| {
                        let v = values[p];
                        if !v.is_finite() {
                            return vec![];
                        }
                        let (lo, hi, lo_closed, hi_closed) = match self.anchor {
                            WindowAnchor::Start => (v, interval.offset_f64(v, 1), true, false),
                            WindowAnchor::End => (interval.offset_f64(v, -1), v, false, true),
                            WindowAnchor::Middle => {
                                let half = interval.width() / 2.0;
                                (v - half, v + half, true, false)
                            }
                        };
                        (0..n)
                            .filter(|q| {
                                let x = values[*q];
                                (if lo_closed { x >= lo } else { x > lo })
                                    && (if hi_closed { x <= hi } else { x < hi })
                            })
                            .collect()
                    })
                    .collect()
            }
        }
    }

    /// Whether a window holding these values produces output
    pub fn accepts(&self, values: &[RawValue]) -> bool {
        match self.strict {
            Some(min) => values.iter().filter(|v| v.is_defined()).count() >= min,
            None => true,
        }
    }

    fn strict_threshold(&self) -> usize {
        match self.size {
            WindowSize::Count(k) => k,
            WindowSize::Interval(_) => 1,
        }
    }
}

/// Rolling reduction over consecutive rows of each series.
///
/// Applies to whichever of `y`, `y1`, `y2` (or the x equivalents) are set.
#[derive(Debug, Clone)]
pub struct Window {
    axis: Axis,
    spec: WindowSpec,
    reducer: Reducer,
}

impl Window {
    fn new(axis: Axis, size: WindowSize) -> Self {
        Self {
            axis,
            spec: WindowSpec {
                size,
                anchor: WindowAnchor::Middle,
                strict: None,
            },
            reducer: Reducer::Mean,
        }
    }

    /// Smooth y values along x
    pub fn y(size: WindowSize) -> Self {
        Self::new(Axis::Y, size)
    }

    /// Smooth x values along y
    pub fn x(size: WindowSize) -> Self {
        Self::new(Axis::X, size)
    }

    pub fn anchor(mut self, anchor: WindowAnchor) -> Self {
        self.spec.anchor = anchor;
        self
    }

    pub fn reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Emit null unless every slot of the window holds a valid value
    pub fn strict(mut self, strict: bool) -> Self {
        self.spec.strict = strict.then(|| self.spec.strict_threshold());
        self
    }

    /// Emit null for windows with fewer than `min` valid values
    pub fn min_valid(mut self, min: usize) -> Self {
        self.spec.strict = Some(min);
        self
    }
}

impl Transform for Window {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let targets: Vec<Channel> = self
            .axis
            .channels()
            .into_iter()
            .filter(|c| ctx.has_channel(*c))
            .collect();
        if targets.is_empty() {
            return Ok(ctx);
        }
        let [key_channel, ..] = self.axis.other().channels();
        let n = ctx.data().len();
        let keys = if ctx.has_channel(key_channel) {
            ctx.column(key_channel)?
        } else {
            vec![RawValue::Null; n]
        };
        let columns = targets
            .iter()
            .map(|c| ctx.column(*c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outputs = vec![vec![RawValue::Null; n]; targets.len()];
        let options = GroupingOptions::facets_and_z().excluding(&targets);
        for group in group_facets(&ctx, &options)? {
            let group_keys: Vec<RawValue> =
                group.indices.iter().map(|i| keys[*i].clone()).collect();
            let windows = self.spec.windows(&group_keys);
            for (column, output) in columns.iter().zip(outputs.iter_mut()) {
                for (p, members) in windows.iter().enumerate() {
                    let values: Vec<RawValue> = members
                        .iter()
                        .map(|q| column[group.indices[*q]].clone())
                        .collect();
                    if self.spec.accepts(&values) {
                        output[group.indices[p]] = self.reducer.reduce(&values);
                    }
                }
            }
        }

        let (mut data, channels, insets) = ctx.into_parts();
        for (channel, values) in targets.iter().zip(outputs) {
            data = with_synthetic_column(data, &channel.to_string(), values);
        }
        let mut out = DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets);
        for channel in targets {
            out = out.with_synthetic_channel(channel, &channel.to_string());
        }
        Ok(out)
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.axis.channels().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::value::Datum;
    use float_cmp::assert_approx_eq;

    fn ctx(values: &[f64]) -> DataContext {
        DataContext::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| record!("t" => i, "v" => *v))
                .collect(),
        )
        .with_channel(Channel::X, "t")
        .with_channel(Channel::Y, "v")
    }

    fn ys(ctx: &DataContext) -> Vec<RawValue> {
        ctx.data()
            .iter()
            .map(|d: &Datum| d.field("__y").cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_anchor_offsets() {
        let spec = |anchor| WindowSpec {
            size: WindowSize::Count(3),
            anchor,
            strict: None,
        };
        let keys = vec![RawValue::Null; 4];
        assert_eq!(spec(WindowAnchor::Start).windows(&keys)[0], vec![0, 1, 2]);
        assert_eq!(spec(WindowAnchor::Middle).windows(&keys)[1], vec![0, 1, 2]);
        assert_eq!(spec(WindowAnchor::End).windows(&keys)[2], vec![0, 1, 2]);
        assert_eq!(spec(WindowAnchor::End).windows(&keys)[0], vec![0]);
    }

    #[test]
    fn test_window_mean() {
        let out = Window::y(WindowSize::Count(3))
            .transform(ctx(&[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        let values: Vec<f64> = ys(&out).iter().map(RawValue::to_f64).collect();
        for (value, expected) in values.iter().zip([1.5, 2.0, 3.0, 3.5]) {
            assert_approx_eq!(f64, *value, expected);
        }
        assert_eq!(out.channel(Channel::Y).unwrap().as_field(), Some("__y"));
    }

    #[test]
    fn test_window_strict() {
        let out = Window::y(WindowSize::Count(2))
            .anchor(WindowAnchor::End)
            .reducer(Reducer::Sum)
            .strict(true)
            .transform(ctx(&[1.0, 2.0, f64::NAN, 4.0]))
            .unwrap();
        assert_eq!(
            ys(&out),
            vec![
                RawValue::Null,
                RawValue::from(3.0),
                RawValue::Null,
                RawValue::Null
            ]
        );
    }

    #[test]
    fn test_window_by_interval() {
        let out = Window::y(WindowSize::Interval(Interval::Number(2.0)))
            .anchor(WindowAnchor::Start)
            .reducer(Reducer::Sum)
            .transform(ctx(&[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        let values: Vec<f64> = ys(&out).iter().map(RawValue::to_f64).collect();
        assert_eq!(values, vec![3.0, 5.0, 7.0, 4.0]);
    }

    #[test]
    fn test_window_size_from_str() {
        assert_eq!("5".parse::<WindowSize>().unwrap(), WindowSize::Count(5));
        assert!(matches!(
            "1 month".parse::<WindowSize>().unwrap(),
            WindowSize::Interval(_)
        ));
        assert!("0".parse::<WindowSize>().is_err());
    }
}
