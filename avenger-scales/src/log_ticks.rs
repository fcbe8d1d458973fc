//! Tick selection for logarithmic scales.
//!
//! Ticks are drawn from per-decade spacing patterns. Each pattern is a list of
//! successive multiplication factors whose product is a whole power of ten, so
//! the resulting mantissas repeat every one (or two) decades. Patterns are
//! tried from sparsest to densest and the first one that yields close to the
//! requested number of ticks wins. When no pattern yields enough ticks (short
//! domains well inside a decade), ordinary linear ticks are used instead.

use crate::array;

const PATTERNS: [&[f64]; 5] = [
    &[10.0],
    &[5.0, 4.0, 5.0],
    &[3.0, 10.0 / 3.0],
    &[2.0, 2.5, 2.0],
    &[1.5, 2.0, 5.0 / 3.0, 2.0],
];

/// Mantissas of one pattern period and the period length in decades.
fn pattern_mantissas(factors: &[f64]) -> (Vec<f64>, i32) {
    let mut mantissas = Vec::with_capacity(factors.len());
    let mut acc = 1.0;
    for f in factors {
        mantissas.push(acc);
        acc *= f;
    }
    (mantissas, acc.log10().round() as i32)
}

/// Log ticks for the domain `[start, stop]`, returned in the direction of the
/// domain. Domains that cross zero have no valid ticks.
pub fn log_ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !start.is_finite() || !stop.is_finite() || !(count > 0.0) {
        return vec![];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };

    let mut ticks = if lo < 0.0 && hi > 0.0 {
        vec![]
    } else if lo == 0.0 || hi == 0.0 {
        array::ticks(lo, hi, count)
    } else if hi < 0.0 {
        let mut reflected: Vec<f64> = positive_log_ticks(-hi, -lo, count)
            .into_iter()
            .map(|v| -v)
            .collect();
        reflected.reverse();
        reflected
    } else {
        positive_log_ticks(lo, hi, count)
    };

    if reverse {
        ticks.reverse();
    }
    ticks
}

fn positive_log_ticks(lo: f64, hi: f64, count: f64) -> Vec<f64> {
    let min_ticks = ((count * 0.8).floor() as usize).max(2);
    let decades = (hi.log10() - lo.log10()).floor() as i32;

    // Very wide domains: one tick every `m` decades.
    for m in (2..=decades).rev() {
        let candidate = ticks_for_pattern(lo, hi, &[1.0], m);
        if candidate.len() >= min_ticks {
            return candidate;
        }
    }

    for factors in PATTERNS {
        let (mantissas, period) = pattern_mantissas(factors);
        let candidate = ticks_for_pattern(lo, hi, &mantissas, period);
        if candidate.len() >= min_ticks {
            return candidate;
        }
    }

    array::ticks(lo, hi, count)
}

fn ticks_for_pattern(lo: f64, hi: f64, mantissas: &[f64], period: i32) -> Vec<f64> {
    let period = period.max(1);
    let k0 = (lo.log10() / period as f64).floor() as i32 - 1;
    let k1 = (hi.log10() / period as f64).ceil() as i32 + 1;
    let lo_tol = lo * (1.0 - 1e-12);
    let hi_tol = hi * (1.0 + 1e-12);

    let mut ticks = Vec::new();
    for k in k0..=k1 {
        let base = 10f64.powi(k * period);
        for m in mantissas {
            let v = round_significant(base * m);
            if v >= lo_tol && v <= hi_tol {
                ticks.push(v);
            }
        }
    }
    ticks
}

/// Round to 12 significant digits to remove accumulated float noise.
fn round_significant(v: f64) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return v;
    }
    let digits = 11 - v.abs().log10().floor() as i32;
    if digits >= 0 {
        let p = 10f64.powi(digits);
        (v * p).round() / p
    } else {
        let p = 10f64.powi(-digits);
        (v / p).round() * p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_domain_uses_sparse_decades() {
        assert_eq!(
            log_ticks(1.0, 1e6, 5.0),
            vec![1.0, 100.0, 10000.0, 1000000.0]
        );
    }

    #[test]
    fn test_single_decade() {
        assert_eq!(log_ticks(1.0, 10.0, 5.0), vec![1.0, 2.0, 5.0, 10.0]);
    }

    #[test]
    fn test_every_decade() {
        assert_eq!(
            log_ticks(1.0, 1000.0, 5.0),
            vec![1.0, 10.0, 100.0, 1000.0]
        );
    }

    #[test]
    fn test_narrow_domain_falls_back_to_linear() {
        assert_eq!(
            log_ticks(2.0, 8.0, 5.0),
            vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
    }

    #[test]
    fn test_crossing_zero_is_empty() {
        assert!(log_ticks(-1.0, 10.0, 5.0).is_empty());
    }

    #[test]
    fn test_zero_endpoint_is_linear() {
        assert_eq!(log_ticks(0.0, 1.0, 2.0), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_negative_domain_reflects() {
        assert_eq!(log_ticks(-10.0, -1.0, 5.0), vec![-10.0, -5.0, -2.0, -1.0]);
    }

    #[test]
    fn test_reversed_domain() {
        assert_eq!(log_ticks(10.0, 1.0, 5.0), vec![10.0, 5.0, 2.0, 1.0]);
    }
}
