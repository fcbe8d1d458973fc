use crate::array::bisect_right;
use crate::error::AvengerScaleError;

/// Maps values onto a discrete range using explicit ascending thresholds.
/// A range of `n + 1` values is required for `n` thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale<V> {
    thresholds: Vec<f64>,
    range: Vec<V>,
}

impl<V: Clone> ThresholdScale<V> {
    pub fn new(thresholds: Vec<f64>, range: Vec<V>) -> Result<Self, AvengerScaleError> {
        if range.is_empty() {
            return Err(AvengerScaleError::EmptyRange);
        }
        if thresholds.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(AvengerScaleError::ThresholdsNotAscending(thresholds));
        }
        if thresholds.len() + 1 != range.len() {
            return Err(AvengerScaleError::ThresholdDomainMismatch {
                domain_len: thresholds.len(),
                range_len: range.len(),
            });
        }
        Ok(Self { thresholds, range })
    }

    pub fn scale(&self, x: f64) -> Option<V> {
        if x.is_nan() {
            return None;
        }
        Some(self.range[bisect_right(&self.thresholds, x)].clone())
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn range(&self) -> &[V] {
        &self.range
    }
}
