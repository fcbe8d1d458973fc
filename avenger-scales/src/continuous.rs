use crate::array::{self, bisect_right};
use crate::error::AvengerScaleError;
use crate::log_ticks::log_ticks;
use crate::time::{time_nice, time_ticks};

/// Transform applied to domain values before linear interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContinuousTransform {
    Identity,
    Pow(f64),
    Log(f64),
    Symlog(f64),
}

impl ContinuousTransform {
    fn forward(&self, x: f64, reflect: bool) -> f64 {
        match self {
            ContinuousTransform::Identity => x,
            ContinuousTransform::Pow(e) => x.signum() * x.abs().powf(*e),
            ContinuousTransform::Log(_) => {
                if reflect {
                    -(-x).ln()
                } else {
                    x.ln()
                }
            }
            ContinuousTransform::Symlog(c) => x.signum() * (x.abs() / c).ln_1p(),
        }
    }

    fn inverse(&self, y: f64, reflect: bool) -> f64 {
        match self {
            ContinuousTransform::Identity => y,
            ContinuousTransform::Pow(e) => y.signum() * y.abs().powf(1.0 / e),
            ContinuousTransform::Log(_) => {
                if reflect {
                    -(-y).exp()
                } else {
                    y.exp()
                }
            }
            ContinuousTransform::Symlog(c) => y.signum() * y.abs().exp_m1() * c,
        }
    }
}

/// Continuous scale mapping a (possibly polylinear) numeric domain onto a
/// numeric range. Time scales are continuous scales over millisecond
/// timestamps with calendar aware ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousScale {
    domain: Vec<f64>,
    range: Vec<f64>,
    transform: ContinuousTransform,
    temporal: bool,
    clamp: bool,
    round: bool,
}

impl ContinuousScale {
    fn try_new(
        domain: Vec<f64>,
        range: Vec<f64>,
        transform: ContinuousTransform,
    ) -> Result<Self, AvengerScaleError> {
        if domain.is_empty() {
            return Err(AvengerScaleError::EmptyDomain);
        }
        if range.is_empty() {
            return Err(AvengerScaleError::EmptyRange);
        }
        // A single value on either side is treated as a degenerate pair
        let domain = if domain.len() == 1 {
            vec![domain[0], domain[0]]
        } else {
            domain
        };
        let range = if range.len() == 1 {
            vec![range[0], range[0]]
        } else {
            range
        };
        if domain.len() != range.len() {
            return Err(AvengerScaleError::DomainRangeMismatch {
                domain_len: domain.len(),
                range_len: range.len(),
            });
        }
        Ok(Self {
            domain,
            range,
            transform,
            temporal: false,
            clamp: false,
            round: false,
        })
    }

    pub fn linear(domain: Vec<f64>, range: Vec<f64>) -> Result<Self, AvengerScaleError> {
        Self::try_new(domain, range, ContinuousTransform::Identity)
    }

    pub fn pow(
        domain: Vec<f64>,
        range: Vec<f64>,
        exponent: f64,
    ) -> Result<Self, AvengerScaleError> {
        Self::try_new(domain, range, ContinuousTransform::Pow(exponent))
    }

    pub fn sqrt(domain: Vec<f64>, range: Vec<f64>) -> Result<Self, AvengerScaleError> {
        Self::pow(domain, range, 0.5)
    }

    pub fn log(domain: Vec<f64>, range: Vec<f64>, base: f64) -> Result<Self, AvengerScaleError> {
        if !(base > 0.0) || base == 1.0 {
            return Err(AvengerScaleError::InvalidScalePropertyValue(format!(
                "log base must be positive and not 1, received {base}"
            )));
        }
        Self::try_new(domain, range, ContinuousTransform::Log(base))
    }

    pub fn symlog(
        domain: Vec<f64>,
        range: Vec<f64>,
        constant: f64,
    ) -> Result<Self, AvengerScaleError> {
        if !(constant > 0.0) {
            return Err(AvengerScaleError::InvalidScalePropertyValue(format!(
                "symlog constant must be positive, received {constant}"
            )));
        }
        Self::try_new(domain, range, ContinuousTransform::Symlog(constant))
    }

    /// Linear scale over millisecond timestamps
    pub fn time(domain: Vec<f64>, range: Vec<f64>) -> Result<Self, AvengerScaleError> {
        let mut scale = Self::try_new(domain, range, ContinuousTransform::Identity)?;
        scale.temporal = true;
        Ok(scale)
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    pub fn range(&self) -> &[f64] {
        &self.range
    }

    pub fn transform(&self) -> ContinuousTransform {
        self.transform
    }

    pub fn is_temporal(&self) -> bool {
        self.temporal
    }

    pub fn clamp(&self) -> bool {
        self.clamp
    }

    pub fn round(&self) -> bool {
        self.round
    }

    /// Log scales over negative domains are reflected
    fn reflect(&self) -> bool {
        matches!(self.transform, ContinuousTransform::Log(_)) && self.domain[0] < 0.0
    }

    /// Extend the outer domain values to round numbers
    pub fn nice(mut self, count: f64) -> Self {
        let n = self.domain.len();
        let (first, last) = (self.domain[0], self.domain[n - 1]);
        if !first.is_finite() || !last.is_finite() {
            return self;
        }
        let (lo, hi) = match self.transform {
            _ if self.temporal => time_nice(first, last, count),
            ContinuousTransform::Log(base) => nice_log(first, last, base),
            _ => {
                if last < first {
                    let (lo, hi) = array::nice(last, first, count);
                    (hi, lo)
                } else {
                    array::nice(first, last, count)
                }
            }
        };
        self.domain[0] = lo;
        self.domain[n - 1] = hi;
        self
    }

    /// Map a domain value to the range. Non-finite inputs map to NaN.
    pub fn scale(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return f64::NAN;
        }
        let reflect = self.reflect();
        let t = self.transform.forward(x, reflect);
        if t.is_nan() {
            return f64::NAN;
        }
        let td: Vec<f64> = self
            .domain
            .iter()
            .map(|d| self.transform.forward(*d, reflect))
            .collect();
        let v = interpolate_segments(&td, &self.range, t, self.clamp);
        if self.round {
            v.round()
        } else {
            v
        }
    }

    /// Map a range value back to the domain
    pub fn invert(&self, y: f64) -> f64 {
        if !y.is_finite() {
            return f64::NAN;
        }
        let reflect = self.reflect();
        let td: Vec<f64> = self
            .domain
            .iter()
            .map(|d| self.transform.forward(*d, reflect))
            .collect();
        let t = interpolate_segments(&self.range, &td, y, self.clamp);
        self.transform.inverse(t, reflect)
    }

    /// Suggested tick values for the current domain
    pub fn ticks(&self, count: f64) -> Vec<f64> {
        let (first, last) = (self.domain[0], self.domain[self.domain.len() - 1]);
        if self.temporal {
            return time_ticks(first, last, count);
        }
        match self.transform {
            ContinuousTransform::Log(_) => log_ticks(first, last, count),
            _ => array::ticks(first, last, count),
        }
    }
}

fn nice_log(first: f64, last: f64, base: f64) -> (f64, f64) {
    let reverse = last < first;
    let (lo, hi) = if reverse { (last, first) } else { (first, last) };
    let log = |v: f64| v.abs().ln() / base.ln();
    let (lo, hi) = if hi < 0.0 {
        (-base.powf(log(lo).ceil()), -base.powf(log(hi).floor()))
    } else if lo > 0.0 {
        (base.powf(log(lo).floor()), base.powf(log(hi).ceil()))
    } else {
        (lo, hi)
    };
    if reverse {
        (hi, lo)
    } else {
        (lo, hi)
    }
}

/// Piecewise linear interpolation of `t` from the `from` breakpoints onto
/// the `to` breakpoints. Breakpoints may be ascending or descending.
fn interpolate_segments(from: &[f64], to: &[f64], t: f64, clamp: bool) -> f64 {
    let n = from.len().min(to.len());
    if n < 2 {
        return to.first().copied().unwrap_or(f64::NAN);
    }
    let descending = from[n - 1] < from[0];
    let (from, to): (Vec<f64>, Vec<f64>) = if descending {
        (
            from[..n].iter().rev().copied().collect(),
            to[..n].iter().rev().copied().collect(),
        )
    } else {
        (from[..n].to_vec(), to[..n].to_vec())
    };

    let i = if n == 2 {
        0
    } else {
        bisect_right(&from[1..n - 1], t)
    };
    let (d0, d1) = (from[i], from[i + 1]);
    let (r0, r1) = (to[i], to[i + 1]);
    let mut u = if d1 == d0 { 0.5 } else { (t - d0) / (d1 - d0) };
    if clamp {
        u = u.clamp(0.0, 1.0);
    }
    r0 + (r1 - r0) * u
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_linear_scale() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![10.0, 30.0], vec![100.0, 200.0])?;
        assert_approx_eq!(f64, scale.scale(20.0), 150.0);
        assert_approx_eq!(f64, scale.scale(40.0), 250.0);
        assert_approx_eq!(f64, scale.invert(150.0), 20.0);
        assert!(scale.scale(f64::NAN).is_nan());
        Ok(())
    }

    #[test]
    fn test_linear_clamp_and_round() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![0.0, 3.0], vec![0.0, 10.0])?
            .with_clamp(true)
            .with_round(true);
        assert_eq!(scale.scale(1.0), 3.0);
        assert_eq!(scale.scale(5.0), 10.0);
        assert_eq!(scale.scale(-5.0), 0.0);
        Ok(())
    }

    #[test]
    fn test_degenerate_domain_maps_to_middle() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![5.0, 5.0], vec![0.0, 100.0])?;
        assert_approx_eq!(f64, scale.scale(5.0), 50.0);
        Ok(())
    }

    #[test]
    fn test_polylinear_diverging() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![-10.0, 0.0, 100.0], vec![0.0, 0.5, 1.0])?;
        assert_approx_eq!(f64, scale.scale(-5.0), 0.25);
        assert_approx_eq!(f64, scale.scale(50.0), 0.75);
        Ok(())
    }

    #[test]
    fn test_descending_domain() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![10.0, 0.0], vec![0.0, 100.0])?;
        assert_approx_eq!(f64, scale.scale(2.5), 75.0);
        assert_approx_eq!(f64, scale.invert(75.0), 2.5);
        Ok(())
    }

    #[test]
    fn test_mismatched_lengths() {
        let err = ContinuousScale::linear(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            AvengerScaleError::DomainRangeMismatch {
                domain_len: 3,
                range_len: 2
            }
        );
    }

    #[test]
    fn test_sqrt_scale() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::sqrt(vec![0.0, 100.0], vec![0.0, 10.0])?;
        assert_approx_eq!(f64, scale.scale(25.0), 5.0);
        assert_approx_eq!(f64, scale.invert(5.0), 25.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_log_scale() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::log(vec![1.0, 100.0], vec![0.0, 2.0], 10.0)?;
        assert_approx_eq!(f64, scale.scale(10.0), 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, scale.invert(1.0), 10.0, epsilon = 1e-9);
        assert!(scale.scale(-1.0).is_nan());
        Ok(())
    }

    #[test]
    fn test_log_scale_negative_domain() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::log(vec![-100.0, -1.0], vec![0.0, 2.0], 10.0)?;
        assert_approx_eq!(f64, scale.scale(-10.0), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_log_nice() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::log(vec![3.0, 420.0], vec![0.0, 1.0], 10.0)?.nice(10.0);
        assert_approx_eq!(f64, scale.domain()[0], 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, scale.domain()[1], 1000.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_symlog_scale() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::symlog(vec![-100.0, 100.0], vec![0.0, 1.0], 1.0)?;
        assert_approx_eq!(f64, scale.scale(0.0), 0.5);
        assert_approx_eq!(f64, scale.invert(scale.scale(42.0)), 42.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_nice_and_ticks() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![0.13, 9.7], vec![0.0, 1.0])?.nice(10.0);
        assert_eq!(scale.domain(), &[0.0, 10.0]);
        assert_eq!(
            scale.ticks(5.0),
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]
        );
        Ok(())
    }

    #[test]
    fn test_reversed_nice() -> Result<(), AvengerScaleError> {
        let scale = ContinuousScale::linear(vec![9.7, 0.13], vec![0.0, 1.0])?.nice(10.0);
        assert_eq!(scale.domain(), &[10.0, 0.0]);
        Ok(())
    }
}
