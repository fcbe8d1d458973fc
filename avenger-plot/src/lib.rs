pub mod channel;
pub mod classify;
pub mod error;
pub mod interval;
pub mod layout;
pub mod mark;
pub mod plot;
pub mod projection;
pub mod reduce;
pub mod resolve;
pub mod scales;
pub mod stats;
pub mod transforms;
pub mod value;

pub use error::AvengerPlotError;

pub mod prelude {
    pub use crate::channel::{Channel, ChannelAccessor, ChannelSpec, ScaleName, ScaleSpec};
    pub use crate::error::AvengerPlotError;
    pub use crate::interval::Interval;
    pub use crate::mark::{Mark, MarkId, MarkType};
    pub use crate::plot::Plot;
    pub use crate::record;
    pub use crate::reduce::Reducer;
    pub use crate::scales::{PlotOptions, PlotScale, ScaleOptions, ScaleType};
    pub use crate::transforms::{DataContext, Transform};
    pub use crate::value::{DataRecord, Datum, RawValue};
}
