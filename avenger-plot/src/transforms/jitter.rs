use std::f64::consts::PI;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::interval::Interval;
use crate::transforms::{with_synthetic_column, Axis, DataContext, Transform};
use crate::value::RawValue;

/// Uniform samples in `[0, 1)`
pub type RandomFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Distribution of the perturbation, in data units (milliseconds for dates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JitterKind {
    /// Uniform in `[-width, width]`
    Uniform(f64),
    /// Normal with the given standard deviation
    Normal(f64),
}

impl Default for JitterKind {
    fn default() -> Self {
        JitterKind::Uniform(0.35)
    }
}

impl JitterKind {
    /// Uniform jitter one interval wide on each side, e.g. `"1 month"`
    pub fn uniform_interval(interval: &str) -> Result<Self, AvengerPlotError> {
        Ok(JitterKind::Uniform(interval.parse::<Interval>()?.width()))
    }

    pub fn normal_interval(interval: &str) -> Result<Self, AvengerPlotError> {
        Ok(JitterKind::Normal(interval.parse::<Interval>()?.width()))
    }
}

#[derive(Clone)]
enum RandomSource {
    Seeded(u64),
    Custom(RandomFn),
}

impl Debug for RandomSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RandomSource::Seeded(seed) => write!(f, "Seeded({seed})"),
            RandomSource::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Random perturbation of a positional channel's numbers or dates
#[derive(Debug, Clone)]
pub struct Jitter {
    axis: Axis,
    kind: JitterKind,
    source: RandomSource,
}

impl Jitter {
    fn new(axis: Axis) -> Self {
        Self {
            axis,
            kind: JitterKind::default(),
            source: RandomSource::Seeded(0),
        }
    }

    pub fn x() -> Self {
        Self::new(Axis::X)
    }

    pub fn y() -> Self {
        Self::new(Axis::Y)
    }

    pub fn kind(mut self, kind: JitterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.source = RandomSource::Seeded(seed);
        self
    }

    /// Draw from a caller-supplied source instead of a seeded generator
    pub fn random<F>(mut self, f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.source = RandomSource::Custom(Arc::new(f));
        self
    }

    fn offsets(&self, n: usize) -> Vec<f64> {
        let mut rng = match &self.source {
            RandomSource::Seeded(seed) => Some(StdRng::seed_from_u64(*seed)),
            RandomSource::Custom(_) => None,
        };
        let mut draw = || match (&mut rng, &self.source) {
            (Some(rng), _) => rng.random::<f64>(),
            (None, RandomSource::Custom(f)) => f(),
            (None, RandomSource::Seeded(_)) => 0.5,
        };
        (0..n)
            .map(|_| match self.kind {
                JitterKind::Uniform(width) => (2.0 * draw() - 1.0) * width,
                JitterKind::Normal(std) => {
                    // Box-Muller
                    let u1 = 1.0 - draw();
                    let u2 = draw();
                    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std
                }
            })
            .collect()
    }
}

impl Transform for Jitter {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let [channel, ..] = self.axis.channels();
        if !ctx.has_channel(channel) {
            return Ok(ctx);
        }
        let column = ctx.column(channel)?;
        let values: Vec<RawValue> = column
            .iter()
            .zip(self.offsets(column.len()))
            .map(|(v, offset)| {
                if v.is_defined() {
                    v.with_number(v.to_f64() + offset)
                } else {
                    RawValue::Null
                }
            })
            .collect();

        let (data, channels, insets) = ctx.into_parts();
        let data = with_synthetic_column(data, &channel.to_string(), values);
        Ok(DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets)
            .with_synthetic_channel(channel, &channel.to_string()))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![self.axis.channels()[0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use chrono::{TimeZone, Utc};
    use float_cmp::assert_approx_eq;

    fn ctx() -> DataContext {
        DataContext::new(vec![record!("v" => 1.0), record!("v" => 5.0)])
            .with_channel(Channel::X, "v")
    }

    fn xs(ctx: &DataContext) -> Vec<f64> {
        ctx.data()
            .iter()
            .map(|d| d.field("__x").map(RawValue::to_f64).unwrap_or(f64::NAN))
            .collect()
    }

    #[test]
    fn test_fixed_source_is_exact() {
        let out = Jitter::x()
            .kind(JitterKind::Uniform(2.0))
            .random(|| 0.75)
            .transform(ctx())
            .unwrap();
        assert_eq!(xs(&out), vec![2.0, 6.0]);
        assert_eq!(out.channel(Channel::X).unwrap().as_field(), Some("__x"));
    }

    #[test]
    fn test_normal_with_fixed_source() {
        let out = Jitter::x()
            .kind(JitterKind::Normal(1.0))
            .random(|| 0.5)
            .transform(ctx())
            .unwrap();
        let expected = (-2.0 * 0.5_f64.ln()).sqrt() * (PI).cos();
        assert_approx_eq!(f64, xs(&out)[0], 1.0 + expected);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = Jitter::y().seed(42);
        let ctx = || {
            DataContext::new((0..10).map(|i| record!("v" => i)).collect())
                .with_channel(Channel::Y, "v")
        };
        let first = a.transform(ctx()).unwrap();
        let second = a.transform(ctx()).unwrap();
        assert_eq!(first.data(), second.data());
        for (i, d) in first.data().iter().enumerate() {
            let v = d.field("__y").map(RawValue::to_f64).unwrap_or(f64::NAN);
            assert!((v - i as f64).abs() <= 0.35);
        }
    }

    #[test]
    fn test_dates_stay_dates() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ctx = DataContext::new(vec![record!("d" => date)]).with_channel(Channel::X, "d");
        let out = Jitter::x()
            .kind(JitterKind::uniform_interval("day").unwrap())
            .random(|| 1.0)
            .transform(ctx)
            .unwrap();
        assert_eq!(
            out.data()[0].field("__x"),
            Some(&RawValue::Date(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()))
        );
    }
}
