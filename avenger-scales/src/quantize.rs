use crate::array::bisect_right;
use crate::error::AvengerScaleError;

/// Divides a continuous `[x0, x1]` domain into uniform segments, one per
/// range value.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeScale<V> {
    domain: [f64; 2],
    range: Vec<V>,
    thresholds: Vec<f64>,
}

impl<V: Clone> QuantizeScale<V> {
    pub fn new(domain: [f64; 2], range: Vec<V>) -> Result<Self, AvengerScaleError> {
        if range.is_empty() {
            return Err(AvengerScaleError::EmptyRange);
        }
        let [x0, x1] = domain;
        let n = range.len() - 1;
        let thresholds = (0..n)
            .map(|i| {
                let i = i as f64;
                let n = n as f64;
                ((i + 1.0) * x1 - (i - n) * x0) / (n + 1.0)
            })
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

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> &[V] {
        &self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_quantize_scale() -> Result<(), AvengerScaleError> {
        let scale = QuantizeScale::new([0.0, 1.0], vec!["a", "b", "c"])?;
        assert_approx_eq!(f64, scale.thresholds()[0], 1.0 / 3.0);
        assert_approx_eq!(f64, scale.thresholds()[1], 2.0 / 3.0);
        assert_eq!(scale.scale(0.2), Some("a"));
        assert_eq!(scale.scale(0.5), Some("b"));
        assert_eq!(scale.scale(2.0), Some("c"));
        Ok(())
    }
}
