use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use strum::{EnumString, IntoStaticStr};

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::reduce::{number_or_null, numbers, Reducer};
use crate::transforms::grouping::{group_facets, GroupingOptions};
use crate::transforms::{with_synthetic_column, Axis, DataContext, Transform};
use crate::value::RawValue;

pub type BasisFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// What each series is divided by
#[derive(Clone, Default, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NormalizeBasis {
    /// First valid value
    #[default]
    First,
    /// Last valid value
    Last,
    Min,
    Max,
    Mean,
    Median,
    Sum,
    /// Distance from the mean in standard deviations, 0 when the deviation is 0
    Deviation,
    /// Rescale `[min, max]` to `[0, 1]`
    Extent,
    #[strum(disabled)]
    Custom(BasisFn),
}

impl NormalizeBasis {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        NormalizeBasis::Custom(Arc::new(f))
    }

    /// Normalize one series in place order
    pub fn apply(&self, values: &[RawValue]) -> Vec<RawValue> {
        let valid = numbers(values);
        let map = |f: &dyn Fn(f64) -> f64| -> Vec<RawValue> {
            values
                .iter()
                .map(|v| {
                    let x = v.to_f64();
                    if x.is_finite() {
                        number_or_null(f(x))
                    } else {
                        RawValue::Null
                    }
                })
                .collect()
        };
        let ratio = |basis: f64| map(&|x| x / basis);

        match self {
            NormalizeBasis::First => ratio(valid.first().copied().unwrap_or(f64::NAN)),
            NormalizeBasis::Last => ratio(valid.last().copied().unwrap_or(f64::NAN)),
            NormalizeBasis::Min => ratio(valid.iter().copied().fold(f64::NAN, f64::min)),
            NormalizeBasis::Max => ratio(valid.iter().copied().fold(f64::NAN, f64::max)),
            NormalizeBasis::Sum => ratio(valid.iter().sum()),
            NormalizeBasis::Mean => ratio(Reducer::Mean.reduce(values).to_f64()),
            NormalizeBasis::Median => ratio(Reducer::Median.reduce(values).to_f64()),
            NormalizeBasis::Deviation => {
                let mean = Reducer::Mean.reduce(values).to_f64();
                let deviation = Reducer::Deviation.reduce(values).to_f64();
                if deviation == 0.0 {
                    map(&|_| 0.0)
                } else {
                    map(&|x| (x - mean) / deviation)
                }
            }
            NormalizeBasis::Extent => {
                let min = valid.iter().copied().fold(f64::NAN, f64::min);
                let max = valid.iter().copied().fold(f64::NAN, f64::max);
                map(&|x| (x - min) / (max - min))
            }
            NormalizeBasis::Custom(f) => ratio(f(&valid)),
        }
    }
}

impl NormalizeBasis {
    pub fn from_name(name: &str) -> Result<Self, AvengerPlotError> {
        NormalizeBasis::from_str(name)
            .map_err(|_| AvengerPlotError::UnknownNormalizeBasis(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            NormalizeBasis::Custom(_) => "custom",
            named => named.into(),
        }
    }
}

impl Display for NormalizeBasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Debug for NormalizeBasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rescale each series of a positional channel relative to a basis.
///
/// Applies to whichever of `x`, `x1`, `x2` (or the y equivalents) are set.
#[derive(Debug, Clone)]
pub struct Normalize {
    axis: Axis,
    basis: NormalizeBasis,
}

impl Normalize {
    pub fn x(basis: NormalizeBasis) -> Self {
        Self {
            axis: Axis::X,
            basis,
        }
    }

    pub fn y(basis: NormalizeBasis) -> Self {
        Self {
            axis: Axis::Y,
            basis,
        }
    }
}

impl Transform for Normalize {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let targets: Vec<Channel> = self
            .axis
            .channels()
            .into_iter()
            .filter(|c| ctx.has_channel(*c))
            .collect();
        let n = ctx.data().len();
        let options = GroupingOptions::facets_and_z().excluding(&targets);
        let groups = group_facets(&ctx, &options)?;

        let mut outputs = Vec::with_capacity(targets.len());
        for channel in &targets {
            let column = ctx.column(*channel)?;
            let mut output = vec![RawValue::Null; n];
            for group in &groups {
                let values: Vec<RawValue> =
                    group.indices.iter().map(|i| column[*i].clone()).collect();
                for (i, v) in group.indices.iter().zip(self.basis.apply(&values)) {
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
