use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use strum::{EnumString, IntoStaticStr};

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::transforms::grouping::{group_facets, GroupingOptions};
use crate::transforms::{with_synthetic_column, Axis, DataContext, Transform};
use crate::value::{compare_defined, Datum, RawValue};

/// Custom mapping over one series: row indices and their values in, one
/// value per row out
pub type MapFn = Arc<dyn Fn(&[usize], &[RawValue]) -> Vec<RawValue> + Send + Sync>;

#[derive(Clone, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum MapMethod {
    /// Running sum, invalid values contribute zero
    Cumsum,
    /// Zero-based rank, ties share the lowest rank
    Rank,
    /// Rank divided by the number of defined values less one
    #[strum(to_string = "quantile-rank", serialize = "quantile")]
    Quantile,
    #[strum(disabled)]
    Custom(MapFn),
}

impl MapMethod {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[usize], &[RawValue]) -> Vec<RawValue> + Send + Sync + 'static,
    {
        MapMethod::Custom(Arc::new(f))
    }

    pub fn apply(&self, indices: &[usize], values: &[RawValue]) -> Vec<RawValue> {
        match self {
            MapMethod::Cumsum => {
                let mut sum = 0.0;
                values
                    .iter()
                    .map(|v| {
                        let x = v.to_f64();
                        if x.is_finite() {
                            sum += x;
                        }
                        RawValue::Number(sum)
                    })
                    .collect()
            }
            MapMethod::Rank => rank(values)
                .into_iter()
                .map(|r| r.map_or(RawValue::Null, RawValue::from))
                .collect(),
            MapMethod::Quantile => {
                let ranks = rank(values);
                let last = ranks.iter().flatten().count().saturating_sub(1);
                ranks
                    .into_iter()
                    .map(|r| match r {
                        Some(r) if last > 0 => RawValue::Number(r as f64 / last as f64),
                        Some(_) => RawValue::Number(0.0),
                        None => RawValue::Null,
                    })
                    .collect()
            }
            MapMethod::Custom(f) => f(indices, values),
        }
    }
}

fn rank(values: &[RawValue]) -> Vec<Option<usize>> {
    let mut order: Vec<usize> = (0..values.len())
        .filter(|i| values[*i].is_defined())
        .collect();
    order.sort_by(|a, b| compare_defined(&values[*a], &values[*b]));
    let mut ranks = vec![None; values.len()];
    let mut current = 0;
    for (position, &i) in order.iter().enumerate() {
        if position > 0 && compare_defined(&values[order[position - 1]], &values[i]).is_ne() {
            current = position;
        }
        ranks[i] = Some(current);
    }
    ranks
}

impl MapMethod {
    pub fn from_name(name: &str) -> Result<Self, AvengerPlotError> {
        MapMethod::from_str(name).map_err(|_| AvengerPlotError::UnknownMapMethod(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapMethod::Custom(_) => "custom",
            named => named.into(),
        }
    }
}

impl Display for MapMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Debug for MapMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Apply an index-aware mapping to each series of a positional channel.
///
/// With none of `x`, `x1`, `x2` set the input is the row itself (bare
/// values) or its position.
#[derive(Debug, Clone)]
pub struct Map {
    axis: Axis,
    method: MapMethod,
}

impl Map {
    pub fn x(method: MapMethod) -> Self {
        Self {
            axis: Axis::X,
            method,
        }
    }

    pub fn y(method: MapMethod) -> Self {
        Self {
            axis: Axis::Y,
            method,
        }
    }
}

impl Transform for Map {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let mut targets: Vec<Channel> = self
            .axis
            .channels()
            .into_iter()
            .filter(|c| ctx.has_channel(*c))
            .collect();
        let columns = if targets.is_empty() {
            let [primary, ..] = self.axis.channels();
            targets.push(primary);
            let identity = ctx
                .data()
                .iter()
                .enumerate()
                .map(|(i, d)| match d {
                    Datum::Value(v) => v.clone(),
                    _ => RawValue::from(i),
                })
                .collect();
            vec![identity]
        } else {
            targets
                .iter()
                .map(|c| ctx.column(*c))
                .collect::<Result<Vec<_>, _>>()?
        };

        let n = ctx.data().len();
        let options = GroupingOptions::facets_and_z().excluding(&targets);
        let groups = group_facets(&ctx, &options)?;
        let mut outputs = Vec::with_capacity(columns.len());
        for column in &columns {
            let mut output = vec![RawValue::Null; n];
            for group in &groups {
                let values: Vec<RawValue> =
                    group.indices.iter().map(|i| column[*i].clone()).collect();
                let mapped = self.method.apply(&group.indices, &values);
                for (i, v) in group.indices.iter().zip(mapped) {
                    output[*i] = v;
                }
            }
            outputs.push(output);
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
