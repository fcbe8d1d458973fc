use crate::channel::{Channel, ChannelSpec};
use crate::error::AvengerPlotError;
use crate::interval::Interval;
use crate::transforms::{synthetic_key, with_synthetic_column, Axis, DataContext, Transform};
use crate::value::RawValue;

/// Derive `[floor(v), offset(floor(v))]` bounds from a single positional
/// channel, for marks such as bars over time periods.
///
/// Does nothing when either bound channel is already set. Adds a one pixel
/// inset on the trailing edge.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTransform {
    axis: Axis,
    interval: Interval,
}

impl IntervalTransform {
    pub fn x(interval: Interval) -> Self {
        Self {
            axis: Axis::X,
            interval,
        }
    }

    pub fn y(interval: Interval) -> Self {
        Self {
            axis: Axis::Y,
            interval,
        }
    }
}

impl Transform for IntervalTransform {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let [primary, lo_channel, hi_channel] = self.axis.channels();
        if ctx.has_channel(lo_channel) || ctx.has_channel(hi_channel) || !ctx.has_channel(primary)
        {
            return Ok(ctx);
        }
        let column = ctx.column(primary)?;
        let (lo, hi): (Vec<RawValue>, Vec<RawValue>) = column
            .iter()
            .map(|v| {
                if !v.is_defined() {
                    return (RawValue::Null, RawValue::Null);
                }
                let start = self.interval.floor(v);
                let end = self.interval.offset(&start, 1);
                (start, end)
            })
            .unzip();

        let (data, channels, mut insets) = ctx.into_parts();
        match self.axis {
            Axis::X => insets.right = insets.right.max(1.0),
            Axis::Y => insets.top = insets.top.max(1.0),
        }
        let data = with_synthetic_column(data, &lo_channel.to_string(), lo);
        let data = with_synthetic_column(data, &hi_channel.to_string(), hi);
        let scale = channels.get(&primary).map(|s| s.scale).unwrap_or_default();
        let mut out = DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets)
            .without_channel(primary);
        for channel in [lo_channel, hi_channel] {
            let mut spec = ChannelSpec::field(synthetic_key(&channel.to_string()));
            spec.scale = scale;
            out = out.with_channel(channel, spec);
        }
        Ok(out)
    }

    fn output_channels(&self) -> Vec<Channel> {
        let [_, lo, hi] = self.axis.channels();
        vec![lo, hi]
    }
}
