//! Scale options, type inference and construction

pub mod create;
pub mod infer;
pub mod options;

pub use create::{create_scale, PlotScale, ScaleFn};
pub use infer::infer_scale_type;
pub use options::{
    default_scale_options, Margins, PlotOptions, PlotOptionsOverride, ScaleOptions,
    ScaleOptionsOverride, ScaleType, ScaleUsageContext,
};
