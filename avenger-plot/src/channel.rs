use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use strum::{Display, EnumString, VariantNames};

use crate::value::{Datum, RawValue};

/// Named visual properties a mark can bind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, VariantNames,
)]
#[strum(serialize_all = "camelCase")]
pub enum Channel {
    X,
    X1,
    X2,
    Y,
    Y1,
    Y2,
    R,
    Length,
    Symbol,
    Fill,
    Stroke,
    Opacity,
    FillOpacity,
    StrokeOpacity,
    Z,
    Sort,
    Filter,
    Interval,
    Fx,
    Fy,
    /// Wrap channel expanded into fx/fy by the facet wrap transform
    Fz,
}

impl Channel {
    /// The scale a channel maps onto by default. Auxiliary channels have none.
    pub fn scale(&self) -> Option<ScaleName> {
        match self {
            Channel::X | Channel::X1 | Channel::X2 => Some(ScaleName::X),
            Channel::Y | Channel::Y1 | Channel::Y2 => Some(ScaleName::Y),
            Channel::R => Some(ScaleName::R),
            Channel::Length => Some(ScaleName::Length),
            Channel::Symbol => Some(ScaleName::Symbol),
            Channel::Fill | Channel::Stroke => Some(ScaleName::Color),
            Channel::Opacity | Channel::FillOpacity | Channel::StrokeOpacity => {
                Some(ScaleName::Opacity)
            }
            Channel::Fx => Some(ScaleName::Fx),
            Channel::Fy => Some(ScaleName::Fy),
            Channel::Z | Channel::Sort | Channel::Filter | Channel::Interval | Channel::Fz => None,
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.scale(), Some(ScaleName::X | ScaleName::Y))
    }

    /// Channels that feed a scale
    pub fn for_scale(scale: ScaleName) -> &'static [Channel] {
        match scale {
            ScaleName::X => &[Channel::X, Channel::X1, Channel::X2],
            ScaleName::Y => &[Channel::Y, Channel::Y1, Channel::Y2],
            ScaleName::R => &[Channel::R],
            ScaleName::Length => &[Channel::Length],
            ScaleName::Symbol => &[Channel::Symbol],
            ScaleName::Color => &[Channel::Fill, Channel::Stroke],
            ScaleName::Opacity => &[
                Channel::Opacity,
                Channel::FillOpacity,
                Channel::StrokeOpacity,
            ],
            ScaleName::Fx => &[Channel::Fx],
            ScaleName::Fy => &[Channel::Fy],
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum ScaleName {
    X,
    Y,
    R,
    Color,
    Opacity,
    Symbol,
    Length,
    Fx,
    Fy,
}

pub type AccessorFn = Arc<dyn Fn(&Datum) -> RawValue + Send + Sync>;

/// How a channel obtains its value for a row
#[derive(Clone)]
pub enum ChannelAccessor {
    Constant(RawValue),
    Field(String),
    Function(AccessorFn),
    /// Resolve through another channel's accessor
    Alias(Channel),
}

impl Debug for ChannelAccessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelAccessor::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ChannelAccessor::Field(name) => f.debug_tuple("Field").field(name).finish(),
            ChannelAccessor::Function(_) => write!(f, "Function(..)"),
            ChannelAccessor::Alias(c) => f.debug_tuple("Alias").field(c).finish(),
        }
    }
}

impl PartialEq for ChannelAccessor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChannelAccessor::Constant(a), ChannelAccessor::Constant(b)) => a == b,
            (ChannelAccessor::Field(a), ChannelAccessor::Field(b)) => a == b,
            (ChannelAccessor::Function(a), ChannelAccessor::Function(b)) => Arc::ptr_eq(a, b),
            (ChannelAccessor::Alias(a), ChannelAccessor::Alias(b)) => a == b,
            _ => false,
        }
    }
}

/// Specifies which scale to use for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleSpec {
    /// The channel's default scale
    #[default]
    Default,
    /// Route the channel to a different scale
    Custom(ScaleName),
    /// No scaling, values are rendered literally
    None,
}

/// A channel's accessor plus its scale routing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelSpec {
    /// `None` resolves the same-named field when present
    pub accessor: Option<ChannelAccessor>,
    pub scale: ScaleSpec,
}

impl ChannelSpec {
    pub fn new(accessor: ChannelAccessor) -> Self {
        Self {
            accessor: Some(accessor),
            scale: ScaleSpec::Default,
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(ChannelAccessor::Field(name.into()))
    }

    pub fn constant(value: impl Into<RawValue>) -> Self {
        Self::new(ChannelAccessor::Constant(value.into()))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Datum) -> RawValue + Send + Sync + 'static,
    {
        Self::new(ChannelAccessor::Function(Arc::new(f)))
    }

    pub fn alias(channel: Channel) -> Self {
        Self::new(ChannelAccessor::Alias(channel))
    }

    /// No accessor: resolves the field named like the channel
    pub fn implicit() -> Self {
        Self::default()
    }

    /// Disable scaling for this channel
    pub fn no_scale(mut self) -> Self {
        self.scale = ScaleSpec::None;
        self
    }

    pub fn with_scale(mut self, scale: ScaleName) -> Self {
        self.scale = ScaleSpec::Custom(scale);
        self
    }

    /// The scale this channel feeds, if any
    pub fn scale_name(&self, channel: Channel) -> Option<ScaleName> {
        match self.scale {
            ScaleSpec::Default => channel.scale(),
            ScaleSpec::Custom(name) => Some(name),
            ScaleSpec::None => None,
        }
    }

    /// The field name when the accessor is a plain field reference
    pub fn as_field(&self) -> Option<&str> {
        match &self.accessor {
            Some(ChannelAccessor::Field(name)) => Some(name),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&RawValue> {
        match &self.accessor {
            Some(ChannelAccessor::Constant(v)) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for ChannelSpec {
    fn from(name: &str) -> Self {
        ChannelSpec::field(name)
    }
}

impl From<String> for ChannelSpec {
    fn from(name: String) -> Self {
        ChannelSpec::field(name)
    }
}

impl From<RawValue> for ChannelSpec {
    fn from(value: RawValue) -> Self {
        ChannelSpec::constant(value)
    }
}

impl From<ChannelAccessor> for ChannelSpec {
    fn from(accessor: ChannelAccessor) -> Self {
        ChannelSpec::new(accessor)
    }
}

/// Channel accessors keyed by channel, in declaration order
pub type Channels = IndexMap<Channel, ChannelSpec>;
