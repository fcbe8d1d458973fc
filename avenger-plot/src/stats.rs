//! Distribution quantiles, linear regression with confidence bands and LOESS

use std::f64::consts::PI;

use itertools::Itertools;

/// Inverse CDF of the standard normal distribution (Wichura's AS241).
/// NaN outside `(0, 1)` except the infinite endpoints.
pub fn normal_quantile(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let q = p - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180625 - q * q;
        return q
            * (((((((r * 2509.080_928_730_122_7 + 33430.575_583_588_128) * r
                + 67265.770_927_008_7)
                * r
                + 45921.953_931_549_87)
                * r
                + 13731.693_765_509_461)
                * r
                + 1971.590_950_306_551_3)
                * r
                + 133.141_667_891_784_38)
                * r
                + 3.387_132_872_796_366_5)
            / (((((((r * 5226.495_278_852_545 + 28729.085_735_721_943) * r
                + 39307.895_800_092_71)
                * r
                + 21213.794_301_586_597)
                * r
                + 5394.196_021_424_751)
                * r
                + 687.187_007_492_057_9)
                * r
                + 42.313_330_701_600_91)
                * r
                + 1.0);
    }

    let mut r = if q < 0.0 { p } else { 1.0 - p };
    r = (-r.ln()).sqrt();
    let value = if r <= 5.0 {
        r -= 1.6;
        (((((((r * 7.745_450_142_783_414e-4 + 0.022_723_844_989_269_184) * r
            + 0.241_780_725_177_450_6)
            * r
            + 1.270_458_252_452_368_4)
            * r
            + 3.647_848_324_763_204_5)
            * r
            + 5.769_497_221_460_691)
            * r
            + 4.630_337_846_156_546)
            * r
            + 1.423_437_110_749_683_5)
            / (((((((r * 1.050_750_071_644_416_9e-9 + 5.475_938_084_995_345e-4) * r
                + 0.015_198_666_563_616_457)
                * r
                + 0.148_103_976_427_480_07)
                * r
                + 0.689_767_334_985_1)
                * r
                + 1.676_384_830_183_803_8)
                * r
                + 2.053_191_626_637_759)
                * r
                + 1.0)
    } else {
        r -= 5.0;
        (((((((r * 2.010_334_399_292_288_1e-7 + 2.711_555_568_743_487_6e-5) * r
            + 0.001_242_660_947_388_078_4)
            * r
            + 0.026_532_189_526_576_124)
            * r
            + 0.296_560_571_828_504_9)
            * r
            + 1.784_826_539_917_291_3)
            * r
            + 5.463_784_911_164_114)
            * r
            + 6.657_904_643_501_103)
            / (((((((r * 2.044_263_103_389_939_7e-15 + 1.421_511_758_316_446e-7) * r
                + 1.846_318_317_510_054_8e-5)
                * r
                + 7.868_691_311_456_133e-4)
                * r
                + 0.014_875_361_290_850_615)
                * r
                + 0.136_929_880_922_735_8)
                * r
                + 0.599_832_206_555_888)
                * r
                + 1.0)
    };
    if q < 0.0 {
        -value
    } else {
        value
    }
}

/// Lanczos approximation of ln Γ(x) for x > 0
fn ln_gamma(x: f64) -> f64 {
    const G: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let sum = G[1..]
        .iter()
        .enumerate()
        .fold(G[0], |acc, (i, g)| acc + g / (x + i as f64 + 1.0));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz)
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const TINY: f64 = 1e-300;
    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..=300 {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < 1e-15 {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b)
fn incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln())
        .exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// CDF of Student's t distribution with `df` degrees of freedom
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if t.is_nan() || !(df > 0.0) {
        return f64::NAN;
    }
    let tail = 0.5 * incomplete_beta(df / (df + t * t), df / 2.0, 0.5);
    if t > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Inverse CDF of Student's t distribution
pub fn t_quantile(p: f64, df: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) || !(df > 0.0) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }

    // Bracket the root, then bisect
    let (mut lo, mut hi) = (-1.0, 1.0);
    while t_cdf(lo, df) > p {
        lo *= 2.0;
    }
    while t_cdf(hi, df) < p {
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if t_cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-12 * hi.abs().max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Ordinary least squares fit of `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    n: usize,
    x_mean: f64,
    sxx: f64,
    /// Residual standard error
    se: f64,
}

impl LinearRegression {
    /// Fit over the pairs where both values are finite. `None` with fewer
    /// than two such pairs or no spread in x.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let points: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (*x, *y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        let n = points.len();
        if n < 2 {
            return None;
        }
        let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
        let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n as f64;
        let sxx: f64 = points.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = points
            .iter()
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let sse: f64 = points
            .iter()
            .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
            .sum();
        let se = if n > 2 {
            (sse / (n - 2) as f64).sqrt()
        } else {
            f64::NAN
        };
        Some(Self {
            slope,
            intercept,
            n,
            x_mean,
            sxx,
            se,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Bounds of the confidence band for the mean at `x`, e.g. `ci = 0.95`.
    /// `None` with fewer than three points.
    pub fn confidence_band(&self, x: f64, ci: f64) -> Option<(f64, f64)> {
        if self.n < 3 || !(0.0..1.0).contains(&ci) {
            return None;
        }
        let t = t_quantile(1.0 - (1.0 - ci) / 2.0, (self.n - 2) as f64);
        let half = t
            * self.se
            * (1.0 / self.n as f64 + (x - self.x_mean).powi(2) / self.sxx).sqrt();
        let y = self.predict(x);
        Some((y - half, y + half))
    }
}

fn tricube(d: f64) -> f64 {
    let d = d.abs();
    if d >= 1.0 {
        0.0
    } else {
        (1.0 - d.powi(3)).powi(3)
    }
}

fn bisquare(u: f64) -> f64 {
    if u.abs() >= 1.0 {
        0.0
    } else {
        (1.0 - u * u).powi(2)
    }
}

fn median(values: &[f64]) -> f64 {
    let sorted: Vec<f64> = values.iter().copied().sorted_by(f64::total_cmp).collect();
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => 0.5 * (sorted[n / 2 - 1] + sorted[n / 2]),
    }
}

/// LOESS smoothing of `ys` over ascending `xs`.
///
/// Each fitted value is a tricube weighted local linear fit over the
/// `bandwidth * n` nearest points; each robustness iteration downweights
/// outliers with bisquare weights of the residuals.
pub fn loess(xs: &[f64], ys: &[f64], bandwidth: f64, robustness_iters: usize) -> Vec<f64> {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return ys[..n].to_vec();
    }
    let span = ((bandwidth * n as f64).floor() as usize).clamp(2, n);
    let mut robustness = vec![1.0; n];
    let mut fitted = vec![0.0; n];

    for iteration in 0..=robustness_iters {
        let mut left = 0;
        for i in 0..n {
            let x = xs[i];
            // Slide the window of `span` nearest neighbours
            while left + span < n && xs[left + span] - x < x - xs[left] {
                left += 1;
            }
            let right = left + span - 1;
            let max_distance = (x - xs[left]).max(xs[right] - x);

            let (mut sw, mut swx, mut swy, mut swxx, mut swxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for j in left..=right {
                let w = if max_distance > 0.0 {
                    tricube((xs[j] - x) / (max_distance * 1.000_001))
                } else {
                    1.0
                } * robustness[j];
                sw += w;
                swx += w * xs[j];
                swy += w * ys[j];
                swxx += w * xs[j] * xs[j];
                swxy += w * xs[j] * ys[j];
            }
            fitted[i] = if sw == 0.0 {
                ys[i]
            } else {
                let mean_x = swx / sw;
                let mean_y = swy / sw;
                let var = swxx / sw - mean_x * mean_x;
                if var.abs() < 1e-12 {
                    mean_y
                } else {
                    let slope = (swxy / sw - mean_x * mean_y) / var;
                    mean_y + slope * (x - mean_x)
                }
            };
        }

        if iteration == robustness_iters {
            break;
        }
        let residuals: Vec<f64> = (0..n).map(|i| (ys[i] - fitted[i]).abs()).collect();
        let scale = 6.0 * median(&residuals);
        if scale == 0.0 {
            break;
        }
        for (weight, r) in robustness.iter_mut().zip(&residuals) {
            *weight = bisquare(r / scale);
        }
    }
    fitted
}
