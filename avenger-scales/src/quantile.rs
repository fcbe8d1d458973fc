use crate::array::{bisect_right, quantile_sorted};
use crate::error::AvengerScaleError;

/// Maps a sample population onto a discrete range so that each range value
/// covers an equal share of the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileScale<V> {
    domain: Vec<f64>,
    range: Vec<V>,
    thresholds: Vec<f64>,
}

impl<V: Clone> QuantileScale<V> {
    /// Non-finite samples are ignored
    pub fn new(samples: Vec<f64>, range: Vec<V>) -> Result<Self, AvengerScaleError> {
        if range.is_empty() {
            return Err(AvengerScaleError::EmptyRange);
        }
        let mut domain: Vec<f64> = samples.into_iter().filter(|v| v.is_finite()).collect();
        if domain.is_empty() {
            return Err(AvengerScaleError::EmptyDomain);
        }
        domain.sort_by(f64::total_cmp);

        let n = range.len();
        let thresholds = (1..n)
            .filter_map(|i| quantile_sorted(&domain, i as f64 / n as f64))
            .collect();
        Ok(Self {
            domain,
            range,
            thresholds,
        })
    }

    pub fn scale(&self, x: f64) -> Option<V> {
        if x.is_nan() {
            return None;
        }
        Some(self.range[bisect_right(&self.thresholds, x)].clone())
    }

    /// The quantile boundaries between consecutive range values
    pub fn quantiles(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    pub fn range(&self) -> &[V] {
        &self.range
    }
}
