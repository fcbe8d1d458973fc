use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::interval::SignedInterval;
use crate::transforms::{with_synthetic_column, Axis, DataContext, Transform};

/// Offset positional channels by a number or a signed calendar interval.
///
/// Shifted values go to new synthetic fields; the source fields are left
/// untouched.
#[derive(Debug, Clone, Copy)]
pub struct Shift {
    axis: Axis,
    offset: SignedInterval,
}

impl Shift {
    pub fn x(offset: SignedInterval) -> Self {
        Self {
            axis: Axis::X,
            offset,
        }
    }

    pub fn y(offset: SignedInterval) -> Self {
        Self {
            axis: Axis::Y,
            offset,
        }
    }

    /// Shift x by an expression such as `"+3 days"`, `"-1 week"` or `"2"`
    pub fn parse_x(offset: &str) -> Result<Self, AvengerPlotError> {
        Ok(Self::x(offset.parse()?))
    }

    pub fn parse_y(offset: &str) -> Result<Self, AvengerPlotError> {
        Ok(Self::y(offset.parse()?))
    }
}

impl Transform for Shift {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let targets: Vec<Channel> = self
            .axis
            .channels()
            .into_iter()
            .filter(|c| ctx.has_channel(*c))
            .collect();
        let mut shifted = Vec::with_capacity(targets.len());
        for channel in &targets {
            let column = ctx.column(*channel)?;
            shifted.push(column.iter().map(|v| self.offset.apply(v)).collect());
        }

        let (mut data, channels, insets) = ctx.into_parts();
        for (channel, values) in targets.iter().zip(shifted) {
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
    use crate::value::RawValue;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_shift_dates() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let ctx = DataContext::new(vec![record!("d" => date, "e" => date)])
            .with_channel(Channel::X1, "d")
            .with_channel(Channel::X2, "e");
        let out = Shift::parse_x("-1 week").unwrap().transform(ctx).unwrap();
        let expected = RawValue::Date(Utc.with_ymd_and_hms(2024, 2, 23, 0, 0, 0).unwrap());
        assert_eq!(out.data()[0].field("__x1"), Some(&expected));
        assert_eq!(out.data()[0].field("__x2"), Some(&expected));
        assert_eq!(out.data()[0].field("d"), Some(&RawValue::Date(date)));
        assert_eq!(out.channel(Channel::X1).unwrap().as_field(), Some("__x1"));
    }

    #[test]
    fn test_shift_numbers() {
        let ctx = DataContext::new(vec![record!("v" => 10)]).with_channel(Channel::Y, "v");
        let out = Shift::y(SignedInterval::number(-2.5)).transform(ctx).unwrap();
        assert_eq!(out.data()[0].field("__y"), Some(&RawValue::from(7.5)));
    }

    #[test]
    fn test_malformed_offset() {
        assert!(matches!(
            Shift::parse_x("+3 fortnights"),
            Err(AvengerPlotError::InvalidInterval(_))
        ));
    }
}
