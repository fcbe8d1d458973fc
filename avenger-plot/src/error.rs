use avenger_scales::error::AvengerScaleError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvengerPlotError {
    #[error("Invalid scale type `{scale_type}` for scale `{scale}`, allowed types: {allowed}")]
    InvalidScaleType {
        scale: String,
        scale_type: String,
        allowed: String,
    },

    #[error("Unknown reducer: `{0}`")]
    UnknownReducer(String),

    #[error("Unknown normalize basis: `{0}`")]
    UnknownNormalizeBasis(String),

    #[error("Unknown map method: `{0}`")]
    UnknownMapMethod(String),

    #[error("Invalid sort option: {0}")]
    InvalidSortOption(String),

    #[error("Invalid select option: {0}")]
    InvalidSelectOption(String),

    #[error("Multiple channel aliases are not allowed: `{from}` -> `{to}`")]
    MultipleChannelAliases { from: String, to: String },

    #[error("Invalid interval: `{0}`")]
    InvalidInterval(String),

    #[error("Missing required channel `{channel}` for {context}")]
    MissingChannel { channel: String, context: String },

    #[error("Scale error: `{0}`")]
    ScaleError(#[from] AvengerScaleError),
}
