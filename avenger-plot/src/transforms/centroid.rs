use geo::Centroid;

use crate::channel::{Channel, ChannelSpec};
use crate::error::AvengerPlotError;
use crate::transforms::{DataContext, Transform};
use crate::value::{Datum, RawValue};

/// Position rows at the centroid of their geometry.
///
/// Replaces `x` and `y` with accessors reading the centroid of each row's
/// geometry; rows without geometry resolve to null.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoCentroid;

fn centroid(datum: &Datum) -> Option<geo::Point<f64>> {
    datum.geometry().and_then(|g| g.centroid())
}

impl Transform for GeoCentroid {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        Ok(ctx
            .with_channel(
                Channel::X,
                ChannelSpec::function(|d| {
                    centroid(d).map_or(RawValue::Null, |p| RawValue::from(p.x()))
                }),
            )
            .with_channel(
                Channel::Y,
                ChannelSpec::function(|d| {
                    centroid(d).map_or(RawValue::Null, |p| RawValue::from(p.y()))
                }),
            ))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![Channel::X, Channel::Y]
    }
}
