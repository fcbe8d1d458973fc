pub mod array;
pub mod band;
pub mod color;
pub mod continuous;
pub mod error;
pub mod log_ticks;
pub mod ordinal;
pub mod quantile;
pub mod quantize;
pub mod threshold;
pub mod time;

pub use error::AvengerScaleError;
