#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvengerScaleError {
    #[error("Domain length ({domain_len}) does not match range length ({range_len})")]
    DomainRangeMismatch { domain_len: usize, range_len: usize },

    #[error("Empty domain")]
    EmptyDomain,

    #[error("Empty range")]
    EmptyRange,

    #[error("Thresholds must be in ascending order: {0:?}")]
    ThresholdsNotAscending(Vec<f64>),

    #[error(
        "Threshold domain length ({domain_len}) must be one less than range length ({range_len})"
    )]
    ThresholdDomainMismatch { domain_len: usize, range_len: usize },

    #[error("Unknown color scheme: {0}")]
    UnknownColorScheme(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid scale property value: {0}")]
    InvalidScalePropertyValue(String),
}
