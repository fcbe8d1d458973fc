use std::sync::atomic::{AtomicU64, Ordering};

use strum::{Display, EnumString, VariantNames};

use crate::channel::{Channel, ChannelSpec, Channels};
use crate::error::AvengerPlotError;
use crate::transforms::{DataContext, Transform};
use crate::value::Datum;

/// Closed set of mark kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames)]
#[strum(serialize_all = "camelCase")]
pub enum MarkType {
    Area,
    Arrow,
    AxisX,
    AxisY,
    BarX,
    BarY,
    Bollinger,
    #[strum(serialize = "box")]
    BoxPlot,
    Brush,
    Cell,
    Dot,
    Frame,
    Geo,
    GridX,
    GridY,
    Line,
    Rect,
    Regression,
    RuleX,
    RuleY,
    Spike,
    Text,
    TickX,
    TickY,
    Vector,
}

const COMMON_CHANNELS: [Channel; 10] = [
    Channel::Fill,
    Channel::Stroke,
    Channel::Opacity,
    Channel::FillOpacity,
    Channel::StrokeOpacity,
    Channel::Z,
    Channel::Sort,
    Channel::Filter,
    Channel::Fx,
    Channel::Fy,
];

impl MarkType {
    /// Channels specific to this mark type, in addition to the style,
    /// grouping and facet channels every mark accepts
    fn own_channels(&self) -> &'static [Channel] {
        use Channel::*;
        match self {
            MarkType::Area | MarkType::Arrow => &[X, X1, X2, Y, Y1, Y2],
            MarkType::Rect => &[X, X1, X2, Y, Y1, Y2, Interval],
            MarkType::AxisX | MarkType::GridX => &[X],
            MarkType::AxisY | MarkType::GridY => &[Y],
            MarkType::BarX => &[X, X1, X2, Y, Interval],
            MarkType::BarY => &[X, Y, Y1, Y2, Interval],
            MarkType::Dot => &[X, Y, R, Symbol],
            MarkType::Geo => &[R],
            MarkType::Frame => &[],
            MarkType::RuleX => &[X, Y1, Y2],
            MarkType::RuleY => &[Y, X1, X2],
            MarkType::Spike => &[X, Y, Length],
            MarkType::Vector => &[X, Y, R, Length],
            MarkType::Bollinger
            | MarkType::BoxPlot
            | MarkType::Brush
            | MarkType::Cell
            | MarkType::Line
            | MarkType::Regression
            | MarkType::Text
            | MarkType::TickX
            | MarkType::TickY => &[X, Y],
        }
    }

    pub fn supports(&self, channel: Channel) -> bool {
        self.own_channels().contains(&channel) || COMMON_CHANNELS.contains(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.own_channels()
            .iter()
            .chain(COMMON_CHANNELS.iter())
            .copied()
    }
}

/// Opaque unique mark identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(u64);

impl MarkId {
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        MarkId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Pixel insets applied by renderers, set by transforms such as bin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// One visual layer: its data rows and channel bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    id: MarkId,
    mark_type: MarkType,
    data: Vec<Datum>,
    channels: Channels,
    automatic: bool,
    insets: MarkInsets,
}

impl Mark {
    pub fn new(mark_type: MarkType, data: Vec<Datum>) -> Self {
        Self {
            id: MarkId::next(),
            mark_type,
            data,
            channels: Channels::new(),
            automatic: false,
            insets: MarkInsets::default(),
        }
    }

    pub fn with_channel(mut self, channel: Channel, spec: impl Into<ChannelSpec>) -> Self {
        self.channels.insert(channel, spec.into());
        self
    }

    /// Mark as system inserted (implicit axes, grids, frames)
    pub fn automatic(mut self) -> Self {
        self.automatic = true;
        self
    }

    pub fn with_insets(mut self, insets: MarkInsets) -> Self {
        self.insets = insets;
        self
    }

    pub fn with_data(mut self, data: Vec<Datum>) -> Self {
        self.data = data;
        self
    }

    /// Run a transform over this mark's data and channels
    pub fn transform(self, transform: &dyn Transform) -> Result<Self, AvengerPlotError> {
        let ctx = DataContext::new(self.data)
            .with_channels(self.channels)
            .with_insets(self.insets);
        let out = transform.transform(ctx)?;
        let (data, channels, insets) = out.into_parts();
        Ok(Self {
            data,
            channels,
            insets,
            ..self
        })
    }

    /// Re-key this mark, used when it replaces the mark registered as `id`
    pub(crate) fn with_id(mut self, id: MarkId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> MarkId {
        self.id
    }

    pub fn mark_type(&self) -> MarkType {
        self.mark_type
    }

    pub fn data(&self) -> &[Datum] {
        &self.data
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Declared channels this mark type supports
    pub fn supported_channels(&self) -> impl Iterator<Item = (Channel, &ChannelSpec)> {
        self.channels
            .iter()
            .filter(|(c, _)| self.mark_type.supports(**c))
            .map(|(c, s)| (*c, s))
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic
    }

    pub fn insets(&self) -> MarkInsets {
        self.insets
    }

    pub fn has_sort(&self) -> bool {
        self.channels.contains_key(&Channel::Sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mark_type_names() {
        assert_eq!(MarkType::from_str("box").unwrap(), MarkType::BoxPlot);
        assert_eq!(MarkType::BarY.to_string(), "barY");
    }

    #[test]
    fn test_supported_channels_filter() {
        let mark = Mark::new(MarkType::Line, vec![])
            .with_channel(Channel::X, "a")
            .with_channel(Channel::R, "b");
        let supported: Vec<_> = mark.supported_channels().map(|(c, _)| c).collect();
        assert_eq!(supported, vec![Channel::X]);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Mark::new(MarkType::Dot, vec![]);
        let b = Mark::new(MarkType::Dot, vec![]);
        assert_ne!(a.id(), b.id());
    }
}
