use crate::channel::{Channel, ChannelSpec};
use crate::error::AvengerPlotError;
use crate::reduce::Reducer;
use crate::transforms::grouping::{group_facets, GroupingOptions};
use crate::transforms::window::{WindowAnchor, WindowSize, WindowSpec};
use crate::transforms::{synthetic_key, with_synthetic_column, Axis, DataContext, Transform};
use crate::value::RawValue;

/// Moving average of `n` periods with a band `k` standard deviations wide.
///
/// Writes `__lo`, `__avg` and `__hi`, mapped onto `y1`, `y` and `y2` (or
/// the x equivalents). The first `n - 1` rows of each series are null.
#[derive(Debug, Clone)]
pub struct Bollinger {
    axis: Axis,
    n: usize,
    k: f64,
    anchor: WindowAnchor,
}

impl Bollinger {
    fn new(axis: Axis) -> Self {
        Self {
            axis,
            n: 20,
            k: 2.0,
            anchor: WindowAnchor::End,
        }
    }

    pub fn y() -> Self {
        Self::new(Axis::Y)
    }

    pub fn x() -> Self {
        Self::new(Axis::X)
    }

    /// Window size in periods
    pub fn n(mut self, n: usize) -> Self {
        self.n = n.max(1);
        self
    }

    /// Band width in standard deviations
    pub fn k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    pub fn anchor(mut self, anchor: WindowAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

impl Transform for Bollinger {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let [value_channel, lo_channel, hi_channel] = self.axis.channels();
        if !ctx.has_channel(value_channel) {
            return Err(AvengerPlotError::MissingChannel {
                channel: value_channel.to_string(),
                context: "bollinger".to_string(),
            });
        }
        let [key_channel, ..] = self.axis.other().channels();
        let n = ctx.data().len();
        let values = ctx.column(value_channel)?;
        let keys = if ctx.has_channel(key_channel) {
            ctx.column(key_channel)?
        } else {
            vec![RawValue::Null; n]
        };

        let spec = WindowSpec {
            size: WindowSize::Count(self.n),
            anchor: self.anchor,
            strict: Some(self.n),
        };
        let mut lo = vec![RawValue::Null; n];
        let mut avg = vec![RawValue::Null; n];
        let mut hi = vec![RawValue::Null; n];
        let options = GroupingOptions::facets_and_z().excluding(&self.axis.channels());
        for group in group_facets(&ctx, &options)? {
            let group_keys: Vec<RawValue> =
                group.indices.iter().map(|i| keys[*i].clone()).collect();
            for (p, members) in spec.windows(&group_keys).iter().enumerate() {
                let window: Vec<RawValue> = members
                    .iter()
                    .map(|q| values[group.indices[*q]].clone())
                    .collect();
                if !spec.accepts(&window) {
                    continue;
                }
                let mean = Reducer::Mean.reduce(&window).to_f64();
                let deviation = Reducer::Deviation.reduce(&window).to_f64();
                let i = group.indices[p];
                let original = &values[i];
                avg[i] = original.with_number(mean);
                lo[i] = original.with_number(mean - self.k * deviation);
                hi[i] = original.with_number(mean + self.k * deviation);
            }
        }

        let (data, channels, insets) = ctx.into_parts();
        let data = with_synthetic_column(data, "lo", lo);
        let data = with_synthetic_column(data, "avg", avg);
        let data = with_synthetic_column(data, "hi", hi);
        let mut out = DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets);
        let scale = out.channel(value_channel).map(|s| s.scale).unwrap_or_default();
        for (channel, field) in [(value_channel, "avg"), (lo_channel, "lo"), (hi_channel, "hi")] {
            let mut spec = ChannelSpec::field(synthetic_key(field));
            spec.scale = scale;
            out = out.with_channel(channel, spec);
        }
        Ok(out)
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.axis.channels().to_vec()
    }
}
