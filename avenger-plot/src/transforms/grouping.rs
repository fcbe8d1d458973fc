//! Shared grouping: rows are partitioned by `fx`, then `fy`, then a single
//! z-like channel (`z`, else `fill`, else `stroke`).

use indexmap::IndexMap;

use crate::channel::{Channel, ChannelAccessor, Channels};
use crate::error::AvengerPlotError;
use crate::interval::Interval;
use crate::transforms::{synthetic_key, DataContext};
use crate::value::{Datum, GroupKey, RawValue};

#[derive(Debug, Clone, Default)]
pub struct GroupingOptions {
    /// Also split by the z-like channel
    pub by_z: bool,
    /// Bucket numeric and temporal keys
    pub interval: Option<Interval>,
    /// Channels that must not act as grouping keys (typically outputs)
    pub exclude: Vec<Channel>,
}

impl GroupingOptions {
    pub fn facets_and_z() -> Self {
        Self {
            by_z: true,
            ..Default::default()
        }
    }

    pub fn facets_only() -> Self {
        Self::default()
    }

    pub fn excluding(mut self, channels: &[Channel]) -> Self {
        self.exclude.extend_from_slice(channels);
        self
    }

    pub fn with_interval(mut self, interval: Option<Interval>) -> Self {
        self.interval = interval;
        self
    }
}

/// Row indices sharing the same facet and series keys
#[derive(Debug, Clone, PartialEq)]
pub struct FacetGroup {
    /// Key value per grouping channel present in the context
    pub keys: Vec<(Channel, RawValue)>,
    pub indices: Vec<usize>,
}

impl FacetGroup {
    /// Copy this group's keys onto a derived row
    pub fn annotate(&self, mut datum: Datum) -> Datum {
        for (channel, value) in &self.keys {
            datum = datum.with_field(group_field(*channel), value.clone());
        }
        datum
    }
}

/// Synthetic field carrying a grouping key onto reduced rows
pub fn group_field(channel: Channel) -> String {
    synthetic_key(&format!("group_{channel}"))
}

/// The z-like channel: explicit `z`, else `fill`, else `stroke`
pub fn z_channel(ctx: &DataContext, exclude: &[Channel]) -> Option<Channel> {
    [Channel::Z, Channel::Fill, Channel::Stroke]
        .into_iter()
        .find(|c| ctx.has_channel(*c) && !exclude.contains(c))
}

/// Grouping channels in effect for a context
pub fn key_channels(ctx: &DataContext, options: &GroupingOptions) -> Vec<Channel> {
    let mut keys: Vec<Channel> = [Channel::Fx, Channel::Fy]
        .into_iter()
        .filter(|c| ctx.has_channel(*c) && !options.exclude.contains(c))
        .collect();
    if options.by_z {
        keys.extend(z_channel(ctx, &options.exclude));
    }
    keys
}

type Nested<T> = IndexMap<GroupKey, (RawValue, T)>;

/// Partition row indices. Groups are ordered by first appearance of each
/// fx value, then each fy value within it, then each z value.
pub fn group_facets(
    ctx: &DataContext,
    options: &GroupingOptions,
) -> Result<Vec<FacetGroup>, AvengerPlotError> {
    let channels = key_channels(ctx, options);
    let slot = |c: Channel| channels.iter().position(|k| *k == c);
    let fx = slot(Channel::Fx);
    let fy = slot(Channel::Fy);
    let z = channels
        .iter()
        .position(|c| !matches!(c, Channel::Fx | Channel::Fy));

    let mut tree: Nested<Nested<Nested<Vec<usize>>>> = IndexMap::new();
    for (i, datum) in ctx.data().iter().enumerate() {
        let key_value = |pos: Option<usize>| -> Result<RawValue, AvengerPlotError> {
            match pos {
                Some(p) => {
                    let v = ctx.resolve(channels[p], datum)?;
                    Ok(bucket(&v, options.interval.as_ref()))
                }
                None => Ok(RawValue::Null),
            }
        };
        let (a, b, c) = (key_value(fx)?, key_value(fy)?, key_value(z)?);
        let level1 = tree
            .entry(GroupKey::from(&a))
            .or_insert_with(|| (a, IndexMap::new()));
        let level2 = level1
            .1
            .entry(GroupKey::from(&b))
            .or_insert_with(|| (b, IndexMap::new()));
        level2
            .1
            .entry(GroupKey::from(&c))
            .or_insert_with(|| (c, Vec::new()))
            .1
            .push(i);
    }

    let mut groups = Vec::new();
    for (_, (a, by_fy)) in tree {
        for (_, (b, by_z)) in by_fy {
            for (_, (c, indices)) in by_z {
                let mut keys = Vec::with_capacity(channels.len());
                for (k, channel) in channels.iter().enumerate() {
                    let value = if Some(k) == fx {
                        a.clone()
                    } else if Some(k) == fy {
                        b.clone()
                    } else {
                        c.clone()
                    };
                    keys.push((*channel, value));
                }
                groups.push(FacetGroup { keys, indices });
            }
        }
    }
    Ok(groups)
}

fn bucket(value: &RawValue, interval: Option<&Interval>) -> RawValue {
    match (interval, value) {
        (Some(interval), RawValue::Number(_) | RawValue::Date(_)) => interval.floor(value),
        _ => value.clone(),
    }
}

/// Point grouping channels at their carried key fields, leaving constants
pub fn rewire_group_channels(channels: &mut Channels, keys: &[Channel]) {
    for channel in keys {
        if let Some(spec) = channels.get_mut(channel) {
            if spec.as_constant().is_none() {
                spec.accessor = Some(ChannelAccessor::Field(group_field(*channel)));
            }
        }
    }
}
