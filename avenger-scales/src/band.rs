use std::hash::Hash;

use indexmap::IndexSet;

use crate::error::AvengerScaleError;

/// Band scale: maps a discrete domain onto evenly spaced bands of a
/// continuous range.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale<K: Hash + Eq> {
    domain: IndexSet<K>,
    range: [f64; 2],
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    round: bool,
    step: f64,
    bandwidth: f64,
    positions: Vec<f64>,
}

impl<K: Hash + Eq + Clone> BandScale<K> {
    pub fn new(domain: Vec<K>, range: [f64; 2]) -> Self {
        let mut scale = Self {
            domain: domain.into_iter().collect(),
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
            round: false,
            step: 0.0,
            bandwidth: 0.0,
            positions: vec![],
        };
        scale.rescale();
        scale
    }

    /// Sets both inner and outer padding
    pub fn with_padding(mut self, padding: f64) -> Result<Self, AvengerScaleError> {
        let padding = check_unit("padding", padding)?;
        self.padding_inner = padding;
        self.padding_outer = padding;
        self.rescale();
        Ok(self)
    }

    pub fn with_padding_inner(mut self, padding: f64) -> Result<Self, AvengerScaleError> {
        self.padding_inner = check_unit("padding_inner", padding)?;
        self.rescale();
        Ok(self)
    }

    pub fn with_padding_outer(mut self, padding: f64) -> Result<Self, AvengerScaleError> {
        if !(padding >= 0.0) {
            return Err(AvengerScaleError::InvalidScalePropertyValue(format!(
                "padding_outer must be non-negative, received {padding}"
            )));
        }
        self.padding_outer = padding;
        self.rescale();
        Ok(self)
    }

    pub fn with_align(mut self, align: f64) -> Result<Self, AvengerScaleError> {
        self.align = check_unit("align", align)?;
        self.rescale();
        Ok(self)
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self.rescale();
        self
    }

    fn rescale(&mut self) {
        let n = self.domain.len() as f64;
        let [r0, r1] = self.range;
        let reverse = r1 < r0;
        let (start, stop) = if reverse { (r1, r0) } else { (r0, r1) };

        let mut step = (stop - start)
            / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        if self.round {
            step = step.floor();
        }
        let mut start = start + (stop - start - step * (n - self.padding_inner)) * self.align;
        let mut bandwidth = step * (1.0 - self.padding_inner);
        if self.round {
            start = start.round();
            bandwidth = bandwidth.round();
        }

        let mut positions: Vec<f64> = (0..self.domain.len())
            .map(|i| start + step * i as f64)
            .collect();
        if reverse {
            positions.reverse();
        }
        self.step = step;
        self.bandwidth = bandwidth;
        self.positions = positions;
    }

    /// Start position of the band for `value`, or `None` if it is not in the domain
    pub fn scale(&self, value: &K) -> Option<f64> {
        self.domain
            .get_index_of(value)
            .map(|i| self.positions[i])
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn domain(&self) -> impl Iterator<Item = &K> {
        self.domain.iter()
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn padding_inner(&self) -> f64 {
        self.padding_inner
    }

    pub fn padding_outer(&self) -> f64 {
        self.padding_outer
    }

    pub fn align(&self) -> f64 {
        self.align
    }
}

/// Point scale: a band scale with zero bandwidth, so every domain value is
/// placed on a single point. Padding is the outer padding in step units.
#[derive(Debug, Clone, PartialEq)]
pub struct PointScale<K: Hash + Eq> {
    band: BandScale<K>,
}

impl<K: Hash + Eq + Clone> PointScale<K> {
    pub fn new(domain: Vec<K>, range: [f64; 2]) -> Self {
        let mut band = BandScale::new(domain, range);
        band.padding_inner = 1.0;
        band.rescale();
        Self { band }
    }

    pub fn with_padding(mut self, padding: f64) -> Result<Self, AvengerScaleError> {
        self.band = self.band.with_padding_outer(padding)?;
        Ok(self)
    }

    pub fn with_align(mut self, align: f64) -> Result<Self, AvengerScaleError> {
        self.band = self.band.with_align(align)?;
        Ok(self)
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.band = self.band.with_round(round);
        self
    }

    pub fn scale(&self, value: &K) -> Option<f64> {
        self.band.scale(value)
    }

    pub fn step(&self) -> f64 {
        self.band.step()
    }

    pub fn bandwidth(&self) -> f64 {
        0.0
    }

    pub fn domain(&self) -> impl Iterator<Item = &K> {
        self.band.domain()
    }

    pub fn range(&self) -> [f64; 2] {
        self.band.range()
    }
}

fn check_unit(name: &str, value: f64) -> Result<f64, AvengerScaleError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(AvengerScaleError::InvalidScalePropertyValue(format!(
            "{name} must be between 0 and 1, received {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_band_defaults() {
        let scale = BandScale::new(vec!["a", "b", "c"], [0.0, 120.0]);
        assert_approx_eq!(f64, scale.step(), 40.0);
        assert_approx_eq!(f64, scale.bandwidth(), 40.0);
        assert_eq!(scale.scale(&"b"), Some(40.0));
        assert_eq!(scale.scale(&"z"), None);
    }

    #[test]
    fn test_band_padding() -> Result<(), AvengerScaleError> {
        let scale = BandScale::new(vec!["a", "b", "c"], [0.0, 100.0]).with_padding(0.2)?;
        // step = 100 / (3 - 0.2 + 0.4)
        assert_approx_eq!(f64, scale.step(), 31.25);
        assert_approx_eq!(f64, scale.bandwidth(), 25.0);
        assert_approx_eq!(f64, scale.scale(&"a").unwrap(), 6.25);
        Ok(())
    }

    #[test]
    fn test_band_reversed_range() {
        let scale = BandScale::new(vec!["a", "b"], [100.0, 0.0]);
        assert_eq!(scale.scale(&"a"), Some(50.0));
        assert_eq!(scale.scale(&"b"), Some(0.0));
    }

    #[test]
    fn test_band_round() -> Result<(), AvengerScaleError> {
        let scale = BandScale::new(vec!["a", "b", "c"], [0.0, 100.0])
            .with_padding_inner(0.1)?
            .with_round(true);
        assert_eq!(scale.step(), 34.0);
        assert_eq!(scale.bandwidth(), 31.0);
        Ok(())
    }

    #[test]
    fn test_invalid_padding() {
        assert!(BandScale::new(vec![1], [0.0, 1.0]).with_padding(1.5).is_err());
    }

    #[test]
    fn test_point_scale() -> Result<(), AvengerScaleError> {
        let scale = PointScale::new(vec!["a", "b", "c"], [0.0, 100.0]);
        assert_eq!(scale.scale(&"a"), Some(0.0));
        assert_eq!(scale.scale(&"c"), Some(100.0));

        let padded = PointScale::new(vec!["a", "b", "c"], [0.0, 100.0]).with_padding(0.5)?;
        assert_approx_eq!(f64, padded.step(), 100.0 / 3.0);
        assert_approx_eq!(f64, padded.scale(&"a").unwrap(), 100.0 / 6.0);
        Ok(())
    }

    #[test]
    fn test_point_single_value_is_centered() {
        let scale = PointScale::new(vec!["only"], [0.0, 100.0]);
        assert_eq!(scale.scale(&"only"), Some(50.0));
    }
}
