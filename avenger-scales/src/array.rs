//! Array helpers shared by the scales: tick generation, nice domains,
//! quantiles and bisection.

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = 1.4142135623730951; // sqrt(2)

/// Generate approximately `count` evenly spaced, human friendly ticks between
/// `start` and `stop` (inclusive). The ticks are returned in the direction of
/// the input, so a reversed interval yields descending ticks.
pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !(count > 0.0) || start.is_nan() || stop.is_nan() {
        return vec![];
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };

    if !(i2 >= i1) || !inc.is_finite() {
        return vec![];
    }

    let n = (i2 - i1 + 1.0) as usize;
    let mut ticks = Vec::with_capacity(n);
    for i in 0..n {
        let i = i as f64;
        let k = if reverse { i2 - i } else { i1 + i };
        ticks.push(if inc < 0.0 { k / -inc } else { k * inc });
    }
    ticks
}

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = (start * inv).round();
        i2 = (stop * inv).round();
        if i1 / inv < start {
            i1 += 1.0;
        }
        if i2 / inv > stop {
            i2 -= 1.0;
        }
        inc = -inv;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }

    if i2 < i1 && 0.5 <= count && count < 2.0 {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Signed tick increment. Positive values are a step size, negative values
/// are the reciprocal of the step size (for sub-unit steps).
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    if !(count > 0.0) {
        return f64::NAN;
    }
    if start == stop {
        return f64::NEG_INFINITY;
    }
    let (_, _, inc) = tick_spec(start, stop, count);
    inc
}

/// Absolute tick step, negative when `stop < start`.
pub fn tick_step(start: f64, stop: f64, count: f64) -> f64 {
    let reverse = stop < start;
    let inc = if reverse {
        tick_increment(stop, start, count)
    } else {
        tick_increment(start, stop, count)
    };
    let step = if inc < 0.0 { 1.0 / -inc } else { inc };
    if reverse {
        -step
    } else {
        step
    }
}

/// Extend `[start, stop]` so both ends fall on round tick values.
pub fn nice(start: f64, stop: f64, count: f64) -> (f64, f64) {
    let (mut start, mut stop) = (start, stop);
    let mut prestep: Option<f64> = None;
    // The step can oscillate near powers of ten, so cap the refinement.
    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if Some(step) == prestep || step == 0.0 || !step.is_finite() {
            return (start, stop);
        } else if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else {
            start = (start * step).ceil() / step;
            stop = (stop * step).floor() / step;
        }
        prestep = Some(step);
    }
    (start, stop)
}

/// Quantile of an ascending sorted slice using linear interpolation between
/// closest ranks. Returns `None` for an empty slice or `p` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 || p <= 0.0 {
        return Some(sorted[0]);
    }
    if p >= 1.0 {
        return Some(sorted[n - 1]);
    }
    let i = (n - 1) as f64 * p;
    let i0 = i.floor() as usize;
    let v0 = sorted[i0];
    let v1 = sorted[i0 + 1];
    Some(v0 + (v1 - v0) * (i - i0 as f64))
}

/// Index of the first element in `sorted` greater than `x`.
pub fn bisect_right(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|v| *v <= x)
}

/// Index of the first element in `sorted` greater than or equal to `x`.
pub fn bisect_left(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|v| *v < x)
}

/// Minimum and maximum of the finite values, or `None` if there are none.
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_ticks() {
        assert_eq!(
            ticks(0.0, 1.0, 10.0),
            vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
        );
        assert_eq!(ticks(0.0, 1.0, 5.0), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(ticks(0.0, 1.0, 2.0), vec![0.0, 0.5, 1.0]);
        assert_eq!(ticks(0.0, 1.0, 1.0), vec![0.0, 1.0]);
        assert_eq!(ticks(0.0, 100.0, 10.0)[1], 10.0);
    }

    #[test]
    fn test_ticks_reversed() {
        assert_eq!(ticks(1.0, 0.0, 2.0), vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_ticks_edge_cases() {
        assert!(ticks(f64::NAN, 1.0, 1.0).is_empty());
        assert!(ticks(0.0, 1.0, 0.0).is_empty());
        assert!(ticks(0.0, 1.0, -1.0).is_empty());
        assert_eq!(ticks(1.0, 1.0, 10.0), vec![1.0]);
    }

    #[test]
    fn test_tick_increment_and_step() {
        assert_eq!(tick_increment(0.0, 1.0, 10.0), -10.0);
        assert_eq!(tick_increment(0.0, 100.0, 10.0), 10.0);
        assert_approx_eq!(f64, tick_step(0.0, 1.0, 10.0), 0.1);
        assert_approx_eq!(f64, tick_step(1.0, 0.0, 10.0), -0.1);
    }

    #[test]
    fn test_nice() {
        assert_eq!(nice(0.1, 0.97, 10.0), (0.1, 1.0));
        assert_eq!(nice(1.1, 10.9, 10.0), (1.0, 11.0));
        assert_eq!(nice(-12.0, 87.0, 5.0), (-20.0, 100.0));
        assert_eq!(nice(0.0, 0.0, 10.0), (0.0, 0.0));
    }

    #[test]
    fn test_quantile_sorted() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&values, 1.0), Some(4.0));
        assert_approx_eq!(f64, quantile_sorted(&values, 0.5).unwrap(), 2.5);
        assert_approx_eq!(f64, quantile_sorted(&values, 0.25).unwrap(), 1.75);
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_bisect() {
        let values = [1.0, 2.0, 2.0, 3.0];
        assert_eq!(bisect_right(&values, 2.0), 3);
        assert_eq!(bisect_left(&values, 2.0), 1);
        assert_eq!(bisect_right(&values, 0.0), 0);
        assert_eq!(bisect_right(&values, 5.0), 4);
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }
}
