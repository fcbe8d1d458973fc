//! Data transforms. Each consumes a [`DataContext`] and produces a new one
//! with synthetic fields added and channel accessors rewritten to them.

pub mod bin;
pub mod bollinger;
pub mod centroid;
pub mod facet_wrap;
pub mod filter;
pub mod group;
pub mod grouping;
pub mod interval;
pub mod jitter;
pub mod map;
pub mod normalize;
pub mod recordize;
pub mod rename;
pub mod select;
pub mod shift;
pub mod sort;
pub mod stack;
pub mod window;

pub use bin::{bin_values, Bin, BinEdges, Thresholds};
pub use bollinger::Bollinger;
pub use centroid::GeoCentroid;
pub use facet_wrap::FacetWrap;
pub use filter::Filter;
pub use group::Group;
pub use interval::IntervalTransform;
pub use jitter::{Jitter, JitterKind};
pub use map::{Map, MapMethod};
pub use normalize::{Normalize, NormalizeBasis};
pub use recordize::Recordize;
pub use rename::{RenameChannels, ReplaceChannels};
pub use select::{Select, Selector};
pub use shift::Shift;
pub use sort::{Reverse, Shuffle, Sort, SortKey, SortOptions};
pub use stack::{Stack, StackOffset, StackOrder};
pub use window::{Window, WindowAnchor, WindowSize};

use crate::channel::{Channel, ChannelSpec, Channels};
use crate::error::AvengerPlotError;
use crate::mark::MarkInsets;
use crate::resolve::{resolve_channel, resolve_column};
use crate::value::{Datum, RawValue};

/// Prefix reserved for fields introduced by transforms
pub const SYNTHETIC_PREFIX: &str = "__";

/// Field name for a transform-derived value
pub fn synthetic_key(name: &str) -> String {
    format!("{SYNTHETIC_PREFIX}{name}")
}

pub fn is_synthetic(name: &str) -> bool {
    name.starts_with(SYNTHETIC_PREFIX)
}

/// Rows plus the channel accessors that read them, threaded through a
/// chain of transforms
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataContext {
    data: Vec<Datum>,
    channels: Channels,
    insets: MarkInsets,
}

impl DataContext {
    pub fn new(data: Vec<Datum>) -> Self {
        Self {
            data,
            channels: Channels::new(),
            insets: MarkInsets::default(),
        }
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    /// Set or replace a channel accessor
    pub fn with_channel(mut self, channel: Channel, spec: impl Into<ChannelSpec>) -> Self {
        self.channels.insert(channel, spec.into());
        self
    }

    /// Point a channel at the synthetic field `__<name>`, keeping its scale routing
    pub fn with_synthetic_channel(mut self, channel: Channel, name: &str) -> Self {
        let scale = self.channel(channel).map(|s| s.scale).unwrap_or_default();
        let mut spec = ChannelSpec::field(synthetic_key(name));
        spec.scale = scale;
        self.channels.insert(channel, spec);
        self
    }

    pub fn without_channel(mut self, channel: Channel) -> Self {
        self.channels.shift_remove(&channel);
        self
    }

    pub fn with_data(mut self, data: Vec<Datum>) -> Self {
        self.data = data;
        self
    }

    pub fn with_insets(mut self, insets: MarkInsets) -> Self {
        self.insets = insets;
        self
    }

    pub fn data(&self) -> &[Datum] {
        &self.data
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn channel(&self, channel: Channel) -> Option<&ChannelSpec> {
        self.channels.get(&channel)
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn insets(&self) -> MarkInsets {
        self.insets
    }

    pub fn into_parts(self) -> (Vec<Datum>, Channels, MarkInsets) {
        (self.data, self.channels, self.insets)
    }

    pub fn resolve(&self, channel: Channel, datum: &Datum) -> Result<RawValue, AvengerPlotError> {
        resolve_channel(channel, datum, &self.channels)
    }

    /// Resolve a channel for every row
    pub fn column(&self, channel: Channel) -> Result<Vec<RawValue>, AvengerPlotError> {
        resolve_column(channel, &self.data, &self.channels)
    }
}

/// Base trait for all transforms
pub trait Transform: Send + Sync {
    /// Apply the transform to a data context
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError>;

    /// Channels this transform rewrites to synthetic fields
    fn output_channels(&self) -> Vec<Channel>;
}

/// Which positional axis a transform operates along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Primary and the two secondary channels along this axis
    pub fn channels(&self) -> [Channel; 3] {
        match self {
            Axis::X => [Channel::X, Channel::X1, Channel::X2],
            Axis::Y => [Channel::Y, Channel::Y1, Channel::Y2],
        }
    }

    pub fn other(&self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Write `value` under the synthetic field for `name` on each row
pub(crate) fn with_synthetic_column(
    data: Vec<Datum>,
    name: &str,
    values: Vec<RawValue>,
) -> Vec<Datum> {
    let key = synthetic_key(name);
    data.into_iter()
        .zip(values)
        .map(|(d, v)| d.with_field(key.clone(), v))
        .collect()
}
