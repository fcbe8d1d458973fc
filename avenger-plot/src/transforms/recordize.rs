use crate::channel::{Channel, ChannelSpec};
use crate::error::AvengerPlotError;
use crate::transforms::{synthetic_key, Axis, DataContext, Transform};
use crate::value::{DataRecord, Datum, RawValue};

/// Promote bare values into records carrying `__value` and `__index`.
///
/// The value feeds the primary channel of the axis and the index the other
/// axis, unless those channels are already set. Input holding any record or
/// tuple row is left unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Recordize {
    axis: Axis,
}

impl Recordize {
    /// Values along x, indices along y
    pub fn x() -> Self {
        Self { axis: Axis::X }
    }

    /// Values along y, indices along x
    pub fn y() -> Self {
        Self { axis: Axis::Y }
    }
}

impl Transform for Recordize {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let values: Option<Vec<RawValue>> = ctx
            .data()
            .iter()
            .map(|datum| match datum {
                Datum::Value(v) => Some(v.clone()),
                _ => None,
            })
            .collect();
        let Some(values) = values else {
            return Ok(ctx);
        };
        let value_key = synthetic_key("value");
        let index_key = synthetic_key("index");
        let data: Vec<Datum> = ctx
            .data()
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (datum, value))| {
                Datum::Record(
                    DataRecord::new()
                        .with(value_key.clone(), value)
                        .with(index_key.clone(), i)
                        .with_original(datum.clone()),
                )
            })
            .collect();

        let [value_channel, ..] = self.axis.channels();
        let [index_channel, ..] = self.axis.other().channels();
        let mut out = ctx.with_data(data);
        if !out.has_channel(value_channel) {
            out = out.with_channel(value_channel, ChannelSpec::field(value_key));
        }
        if !out.has_channel(index_channel) {
            out = out.with_channel(index_channel, ChannelSpec::field(index_key));
        }
        Ok(out)
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![self.axis.channels()[0], self.axis.other().channels()[0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_recordize_bare_values() {
        let ctx = DataContext::new(vec![Datum::from(RawValue::from(4)), Datum::from(RawValue::from(9))]);
        let out = Recordize::x().transform(ctx).unwrap();
        assert_eq!(
            out.column(Channel::X).unwrap(),
            vec![RawValue::from(4), RawValue::from(9)]
        );
        assert_eq!(
            out.column(Channel::Y).unwrap(),
            vec![RawValue::from(0), RawValue::from(1)]
        );
        assert_eq!(out.data()[1].original(), &Datum::Value(RawValue::from(9)));
    }

    #[test]
    fn test_functions_see_original_value() {
        let ctx = DataContext::new(vec![Datum::from(RawValue::from(3))]).with_channel(
            Channel::Y,
            ChannelSpec::function(|d| match d {
                Datum::Value(v) => RawValue::from(v.to_f64() * 10.0),
                _ => RawValue::Null,
            }),
        );
        let out = Recordize::x().transform(ctx).unwrap();
        assert_eq!(out.column(Channel::Y).unwrap(), vec![RawValue::from(30.0)]);
    }

    #[test]
    fn test_tuples_unchanged() {
        let ctx = DataContext::new(vec![
            Datum::Tuple(vec![RawValue::from(1.0), RawValue::from(2.0)]),
            Datum::Tuple(vec![RawValue::from(3.0), RawValue::from(4.0)]),
        ]);
        let before = ctx.column(Channel::X).unwrap();
        assert_eq!(before, vec![RawValue::from(1.0), RawValue::from(3.0)]);

        let out = Recordize::x().transform(ctx.clone()).unwrap();
        assert_eq!(out.column(Channel::X).unwrap(), before);
        assert_eq!(
            out.column(Channel::Y).unwrap(),
            vec![RawValue::from(2.0), RawValue::from(4.0)]
        );
        assert_eq!(out, ctx);
    }

    #[test]
    fn test_mixed_rows_unchanged() {
        let ctx = DataContext::new(vec![
            Datum::from(RawValue::from(5)),
            Datum::Tuple(vec![RawValue::from(1.0), RawValue::from(2.0)]),
        ]);
        let out = Recordize::y().transform(ctx.clone()).unwrap();
        assert_eq!(out, ctx);
    }

    #[test]
    fn test_records_unchanged() {
        let ctx = DataContext::new(vec![record!("a" => 1)]);
        let out = Recordize::y().transform(ctx.clone()).unwrap();
        assert_eq!(out, ctx);
    }
}
