use indexmap::IndexMap;

use crate::channel::{Channel, ChannelAccessor, ChannelSpec, Channels};
use crate::error::AvengerPlotError;
use crate::interval::Interval;
use crate::reduce::Reducer;
use crate::transforms::grouping::{
    group_facets, key_channels, rewire_group_channels, GroupingOptions,
};
use crate::transforms::{synthetic_key, DataContext, Transform};
use crate::value::{DataRecord, Datum, GroupKey, RawValue};

/// Group rows by the values of zero, one or two positional channels, then
/// reduce each group (within each facet and series) into one output row.
///
/// Outputs are written to `__<channel>` fields. A reducer reads the
/// same-named channel, falling back to the primary channel of its axis
/// (`y` for `y1`), except `count` which only needs the rows.
#[derive(Debug, Clone)]
pub struct Group {
    keys: Vec<Channel>,
    outputs: IndexMap<Channel, Reducer>,
    interval: Option<Interval>,
}

impl Group {
    fn new(keys: Vec<Channel>) -> Self {
        Self {
            keys,
            outputs: IndexMap::new(),
            interval: None,
        }
    }

    /// Group on `x`, reducing into y channels
    pub fn x() -> Self {
        Self::new(vec![Channel::X])
    }

    /// Group on `y`, reducing into x channels
    pub fn y() -> Self {
        Self::new(vec![Channel::Y])
    }

    /// Group on both `x` and `y`
    pub fn xy() -> Self {
        Self::new(vec![Channel::X, Channel::Y])
    }

    /// Group only by facets and series
    pub fn z() -> Self {
        Self::new(vec![])
    }

    pub fn output(mut self, channel: Channel, reducer: Reducer) -> Self {
        self.outputs.insert(channel, reducer);
        self
    }

    /// Add an output with a named reducer such as `"sum"` or `"p90"`
    pub fn reduce(self, channel: Channel, reducer: &str) -> Result<Self, AvengerPlotError> {
        Ok(self.output(channel, Reducer::from_name(reducer)?))
    }

    /// Bucket the grouping keys
    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    fn input_channel(&self, ctx: &DataContext, channel: Channel) -> Option<Channel> {
        if ctx.has_channel(channel) && !self.keys.contains(&channel) {
            return Some(channel);
        }
        let primary = match channel {
            Channel::X1 | Channel::X2 => Channel::X,
            Channel::Y1 | Channel::Y2 => Channel::Y,
            other => other,
        };
        (ctx.has_channel(primary) && !self.keys.contains(&primary)).then_some(primary)
    }
}

impl Transform for Group {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        for key in &self.keys {
            if !ctx.has_channel(*key) {
                return Err(AvengerPlotError::MissingChannel {
                    channel: key.to_string(),
                    context: "group".to_string(),
                });
            }
        }

        // Resolve every reducer's input column once
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

        let key_columns = self
            .keys
            .iter()
            .map(|k| ctx.column(*k))
            .collect::<Result<Vec<_>, _>>()?;

        let exclude: Vec<Channel> = self
            .outputs
            .keys()
            .chain(self.keys.iter())
            .copied()
            .collect();
        let options = GroupingOptions::facets_and_z().excluding(&exclude);
        let facet_keys = key_channels(&ctx, &options);

        let mut rows = Vec::new();
        for facet in group_facets(&ctx, &options)? {
            let mut by_key: IndexMap<Vec<GroupKey>, (Vec<RawValue>, Vec<usize>)> =
                IndexMap::new();
            for &i in &facet.indices {
                let values: Vec<RawValue> = key_columns
                    .iter()
                    .map(|col| match &self.interval {
                        Some(interval) if col[i].is_defined() => interval.floor(&col[i]),
                        _ => col[i].clone(),
                    })
                    .collect();
                let key = values.iter().map(GroupKey::from).collect();
                by_key.entry(key).or_insert_with(|| (values, vec![])).1.push(i);
            }

            for (_, (values, indices)) in by_key {
                let mut record = DataRecord::new();
                for (channel, value) in self.keys.iter().zip(values) {
                    record.insert(synthetic_key(&channel.to_string()), value);
                }
                for (channel, reducer) in &self.outputs {
                    let group_values: Vec<RawValue> = match &inputs[channel] {
                        Some(column) => indices.iter().map(|i| column[*i].clone()).collect(),
                        None => vec![RawValue::Null; indices.len()],
                    };
                    record.insert(
                        synthetic_key(&channel.to_string()),
                        reducer.reduce(&group_values),
                    );
                }
                rows.push(facet.annotate(Datum::Record(record)));
            }
        }

        let channels = output_channels(
            ctx.channels(),
            self.keys.iter().chain(self.outputs.keys()),
            &facet_keys,
        );
        Ok(ctx.with_data(rows).with_channels(channels))
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.keys.iter().chain(self.outputs.keys()).copied().collect()
    }
}

/// Rewire derived channels to their synthetic fields, carry grouping
/// channels, keep constants and drop everything else
pub(crate) fn output_channels<'a>(
    input: &Channels,
    derived: impl Iterator<Item = &'a Channel>,
    group_keys: &[Channel],
) -> Channels {
    let mut channels = Channels::new();
    for channel in derived {
        let scale = input.get(channel).map(|s| s.scale).unwrap_or_default();
        let field = synthetic_key(&channel.to_string());
        let mut spec = ChannelSpec::new(ChannelAccessor::Field(field));
        spec.scale = scale;
        channels.insert(*channel, spec);
    }
    for (channel, spec) in input {
        if channels.contains_key(channel) {
            continue;
        }
        if group_keys.contains(channel) || spec.as_constant().is_some() {
            channels.insert(*channel, spec.clone());
        }
    }
    rewire_group_channels(&mut channels, group_keys);
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_group_x_count_and_sum() {
        let ctx = DataContext::new(vec![
            record!("year" => 2000, "value" => 10),
            record!("year" => 2000, "value" => 20),
            record!("year" => 2001, "value" => 15),
        ])
        .with_channel(Channel::X, "year")
        .with_channel(Channel::Y1, "value");
        let out = Group::x()
            .reduce(Channel::Y, "count")
            .unwrap()
            .reduce(Channel::Y1, "sum")
            .unwrap()
            .transform(ctx)
            .unwrap();

        assert_eq!(
            out.data(),
            &[
                record!("__x" => 2000, "__y" => 2, "__y1" => 30),
                record!("__x" => 2001, "__y" => 1, "__y1" => 15),
            ]
        );
        assert_eq!(out.channel(Channel::Y).unwrap().as_field(), Some("__y"));
    }

    #[test]
    fn test_group_by_fill_series() {
        let ctx = DataContext::new(vec![
            record!("k" => "a", "c" => "u"),
            record!("k" => "a", "c" => "v"),
            record!("k" => "a", "c" => "u"),
        ])
        .with_channel(Channel::X, "k")
        .with_channel(Channel::Fill, "c")
        .with_channel(Channel::R, ChannelSpec::constant(3.0));
        let out = Group::x()
            .output(Channel::Y, Reducer::Count)
            .transform(ctx)
            .unwrap();
        assert_eq!(out.data().len(), 2);
        assert_eq!(
            out.data()[0].field("__group_fill"),
            Some(&RawValue::from("u"))
        );
        assert_eq!(out.data()[0].field("__y"), Some(&RawValue::from(2)));
        assert_eq!(
            out.channel(Channel::Fill).unwrap().as_field(),
            Some("__group_fill")
        );
        assert!(out.channel(Channel::R).unwrap().as_constant().is_some());
    }

    #[test]
    fn test_group_with_interval() {
        let ctx = DataContext::new((0..10).map(|i| record!("v" => i)).collect())
            .with_channel(Channel::X, "v");
        let out = Group::x()
            .interval(Interval::Number(5.0))
            .output(Channel::Y, Reducer::Count)
            .transform(ctx)
            .unwrap();
        assert_eq!(out.data().len(), 2);
        assert_eq!(out.data()[1].field("__x"), Some(&RawValue::from(5)));
    }

    #[test]
    fn test_missing_input_channel() {
        let ctx = DataContext::new(vec![record!("k" => 1)]).with_channel(Channel::X, "k");
        let err = Group::x().output(Channel::Y, Reducer::Sum).transform(ctx);
        assert!(matches!(err, Err(AvengerPlotError::MissingChannel { .. })));
    }
}
