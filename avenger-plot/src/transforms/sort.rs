use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::Value;

use crate::channel::{Channel, ChannelAccessor};
use crate::error::AvengerPlotError;
use crate::resolve::resolve_prop;
use crate::transforms::{DataContext, Transform};
use crate::value::{compare_defined, compare_defined_desc, Datum, RawValue};

pub type Comparator = Arc<dyn Fn(&Datum, &Datum) -> Ordering + Send + Sync>;

/// What rows are ordered by
#[derive(Clone)]
pub enum SortKey {
    /// Another channel's resolved value
    Channel { channel: Channel, descending: bool },
    Accessor(ChannelAccessor),
    Comparator(Comparator),
}

impl Debug for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Channel {
                channel,
                descending,
            } => write!(f, "Channel({}{channel})", if *descending { "-" } else { "" }),
            SortKey::Accessor(a) => write!(f, "Accessor({a:?})"),
            SortKey::Comparator(_) => write!(f, "Comparator(..)"),
        }
    }
}

impl FromStr for SortKey {
    type Err = AvengerPlotError;

    /// `"x"` ascending, `"-x"` descending
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let channel = Channel::from_str(name)
            .map_err(|_| AvengerPlotError::InvalidSortOption(format!("unknown channel `{s}`")))?;
        Ok(SortKey::Channel {
            channel,
            descending,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// `None` sorts by the context's `sort` channel
    pub key: Option<SortKey>,
    pub reverse: bool,
}

impl SortOptions {
    pub fn by(key: SortKey) -> Self {
        Self {
            key: Some(key),
            reverse: false,
        }
    }

    /// Accepts `"x"`, `"-x"`, `{"channel": "x", "order": "descending"}` or
    /// `{"channel": "-x"}`, each with an optional `"reverse": true`
    pub fn from_json(value: &Value) -> Result<Self, AvengerPlotError> {
        match value {
            Value::String(s) => Ok(Self::by(s.parse()?)),
            Value::Object(map) => {
                if let Some(extra) = map
                    .keys()
                    .find(|k| !matches!(k.as_str(), "channel" | "order" | "reverse"))
                {
                    return Err(AvengerPlotError::InvalidSortOption(format!(
                        "only one sort channel is allowed, found `{extra}`"
                    )));
                }
                let channel = map
                    .get("channel")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AvengerPlotError::InvalidSortOption("missing `channel`".to_string())
                    })?;
                let mut key: SortKey = channel.parse()?;
                match map.get("order").map(|o| o.as_str()) {
                    None | Some(Some("ascending")) => {}
                    Some(Some("descending")) => {
                        if let SortKey::Channel { descending, .. } = &mut key {
                            *descending = !*descending;
                        }
                    }
                    Some(other) => {
                        return Err(AvengerPlotError::InvalidSortOption(format!(
                            "invalid order {other:?}"
                        )))
                    }
                }
                let reverse = map.get("reverse").and_then(Value::as_bool).unwrap_or(false);
                Ok(Self {
                    key: Some(key),
                    reverse,
                })
            }
            other => Err(AvengerPlotError::InvalidSortOption(other.to_string())),
        }
    }
}

/// Stable sort, nulls last
#[derive(Debug, Clone, Default)]
pub struct Sort {
    options: SortOptions,
}

impl Sort {
    pub fn new(options: SortOptions) -> Self {
        Self { options }
    }

    pub fn by_channel(channel: Channel) -> Self {
        Self::new(SortOptions::by(SortKey::Channel {
            channel,
            descending: false,
        }))
    }

    pub fn descending(mut self) -> Self {
        self.options.reverse = true;
        self
    }
}

impl Transform for Sort {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let data = ctx.data();
        let mut order: Vec<usize> = (0..data.len()).collect();
        let key = match &self.options.key {
            Some(key) => key.clone(),
            None => match ctx.channel(Channel::Sort).and_then(|s| s.accessor.clone()) {
                Some(accessor) => SortKey::Accessor(accessor),
                None => return Ok(ctx),
            },
        };

        match key {
            SortKey::Comparator(cmp) => {
                order.sort_by(|a, b| cmp(&data[*a], &data[*b]));
                if self.options.reverse {
                    order.reverse();
                }
            }
            SortKey::Channel {
                channel,
                descending,
            } => {
                let values = ctx.column(channel)?;
                sort_by_values(&mut order, &values, descending != self.options.reverse);
            }
            SortKey::Accessor(accessor) => {
                let values: Vec<RawValue> = data
                    .iter()
                    .map(|d| resolve_prop(Some(&accessor), d))
                    .collect();
                sort_by_values(&mut order, &values, self.options.reverse);
            }
        }

        let sorted = order.into_iter().map(|i| data[i].clone()).collect();
        Ok(ctx.with_data(sorted))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![]
    }
}

fn sort_by_values(order: &mut [usize], values: &[RawValue], descending: bool) {
    if descending {
        order.sort_by(|a, b| compare_defined_desc(&values[*a], &values[*b]));
    } else {
        order.sort_by(|a, b| compare_defined(&values[*a], &values[*b]));
    }
}

/// Seeded random permutation; clears any `sort` channel
#[derive(Debug, Clone, Copy)]
pub struct Shuffle {
    seed: u64,
}

impl Shuffle {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Transform for Shuffle {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut data = ctx.data().to_vec();
        data.shuffle(&mut rng);
        Ok(ctx.with_data(data).without_channel(Channel::Sort))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse;

impl Transform for Reverse {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let mut data = ctx.data().to_vec();
        data.reverse();
        Ok(ctx.with_data(data))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSpec;
    use crate::record;
    use serde_json::json;

    fn ids(ctx: &DataContext) -> Vec<f64> {
        ctx.data()
            .iter()
            .map(|d| d.field("id").map(RawValue::to_f64).unwrap_or(f64::NAN))
            .collect()
    }

    fn rows() -> DataContext {
        DataContext::new(vec![
            record!("id" => 0, "k" => 2.0),
            record!("id" => 1, "k" => RawValue::Null),
            record!("id" => 2, "k" => 1.0),
            record!("id" => 3, "k" => 2.0),
        ])
        .with_channel(Channel::Y, "k")
    }

    #[test]
    fn test_sort_by_channel() {
        let out = Sort::by_channel(Channel::Y).transform(rows()).unwrap();
        assert_eq!(ids(&out), vec![2.0, 0.0, 3.0, 1.0]);
        let out = Sort::by_channel(Channel::Y)
            .descending()
            .transform(rows())
            .unwrap();
        assert_eq!(ids(&out), vec![0.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_sort_channel_accessor() {
        let ctx = rows().with_channel(Channel::Sort, ChannelSpec::field("k"));
        let out = Sort::default().transform(ctx).unwrap();
        assert_eq!(ids(&out), vec![2.0, 0.0, 3.0, 1.0]);
        assert!(out.has_channel(Channel::Sort));
    }

    #[test]
    fn test_sort_options_from_json() {
        let options = SortOptions::from_json(&json!("-y")).unwrap();
        assert!(matches!(
            options.key,
            Some(SortKey::Channel {
                channel: Channel::Y,
                descending: true
            })
        ));
        let options =
            SortOptions::from_json(&json!({"channel": "x", "order": "descending"})).unwrap();
        assert!(matches!(
            options.key,
            Some(SortKey::Channel {
                channel: Channel::X,
                descending: true
            })
        ));
        assert!(SortOptions::from_json(&json!({"channel": "x", "y": "x"})).is_err());
        assert!(SortOptions::from_json(&json!(3)).is_err());
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let data: Vec<_> = (0..20).map(|i| record!("id" => i)).collect();
        let a = Shuffle::new(7)
            .transform(DataContext::new(data.clone()))
            .unwrap();
        let b = Shuffle::new(7).transform(DataContext::new(data)).unwrap();
        assert_eq!(ids(&a), ids(&b));
        let mut sorted = ids(&a);
        sorted.sort_by(f64::total_cmp);
        assert_eq!(sorted, (0..20).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_reverse() {
        let out = Reverse.transform(rows()).unwrap();
        assert_eq!(ids(&out), vec![3.0, 2.0, 1.0, 0.0]);
    }
}
