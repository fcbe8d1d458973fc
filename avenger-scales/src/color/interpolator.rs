use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use palette::{Hsla, IntoColor, Laba, Mix, Srgba};
use strum::{Display, EnumString};

/// Color space used when blending between color stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum InterpolationSpace {
    #[default]
    Rgb,
    Lab,
    Hsl,
}

/// A continuous `[0, 1] -> color` function
#[derive(Clone)]
pub enum ColorInterpolator {
    /// Evenly spaced color stops
    Ramp {
        stops: Vec<Srgba>,
        space: InterpolationSpace,
    },
    Turbo,
    /// Cubehelix with the hue interpolated the long way around
    Cubehelix {
        start: [f32; 3],
        end: [f32; 3],
    },
    Custom(Arc<dyn Fn(f64) -> Srgba + Send + Sync>),
}

impl Debug for ColorInterpolator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorInterpolator::Ramp { stops, space } => f
                .debug_struct("Ramp")
                .field("stops", &stops.len())
                .field("space", space)
                .finish(),
            ColorInterpolator::Turbo => write!(f, "Turbo"),
            ColorInterpolator::Cubehelix { start, end } => f
                .debug_struct("Cubehelix")
                .field("start", start)
                .field("end", end)
                .finish(),
            ColorInterpolator::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl PartialEq for ColorInterpolator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                ColorInterpolator::Ramp { stops: a, space: sa },
                ColorInterpolator::Ramp { stops: b, space: sb },
            ) => a == b && sa == sb,
            (ColorInterpolator::Turbo, ColorInterpolator::Turbo) => true,
            (
                ColorInterpolator::Cubehelix { start: a0, end: a1 },
                ColorInterpolator::Cubehelix { start: b0, end: b1 },
            ) => a0 == b0 && a1 == b1,
            (ColorInterpolator::Custom(a), ColorInterpolator::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl ColorInterpolator {
    pub fn ramp(stops: Vec<Srgba>) -> Self {
        ColorInterpolator::Ramp {
            stops,
            space: InterpolationSpace::Rgb,
        }
    }

    pub fn with_space(self, space: InterpolationSpace) -> Self {
        match self {
            ColorInterpolator::Ramp { stops, .. } => ColorInterpolator::Ramp { stops, space },
            other => other,
        }
    }

    /// Color at `t`, clamped to `[0, 1]`
    pub fn interpolate(&self, t: f64) -> Srgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            ColorInterpolator::Ramp { stops, space } => match space {
                InterpolationSpace::Rgb => interpolate_stops(stops, t as f32),
                InterpolationSpace::Lab => {
                    let stops: Vec<Laba> = stops.iter().map(|c| (*c).into_color()).collect();
                    interpolate_stops(&stops, t as f32)
                }
                InterpolationSpace::Hsl => {
                    let stops: Vec<Hsla> = stops.iter().map(|c| (*c).into_color()).collect();
                    interpolate_stops(&stops, t as f32)
                }
            },
            ColorInterpolator::Turbo => turbo(t),
            ColorInterpolator::Cubehelix { start, end } => {
                let t = t as f32;
                let lerp = |i: usize| start[i] + (end[i] - start[i]) * t;
                cubehelix(lerp(0), lerp(1), lerp(2))
            }
            ColorInterpolator::Custom(f) => f(t),
        }
    }

    /// Color at `t` as a CSS color string
    pub fn interpolate_css(&self, t: f64) -> String {
        to_css(self.interpolate(t))
    }

    /// `n` evenly spaced samples from 0 to 1 inclusive
    pub fn quantize(&self, n: usize) -> Vec<String> {
        match n {
            0 => vec![],
            1 => vec![self.interpolate_css(0.5)],
            _ => (0..n)
                .map(|i| self.interpolate_css(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

/// Types that stops can be blended in
pub trait ColorSpace: Mix<Scalar = f32> + Copy + IntoColor<Srgba> {}

impl<T: Mix<Scalar = f32> + Copy + IntoColor<Srgba>> ColorSpace for T {}

fn interpolate_stops<C: ColorSpace>(stops: &[C], t: f32) -> Srgba {
    match stops.len() {
        0 => Srgba::new(0.0, 0.0, 0.0, 0.0),
        1 => stops[0].into_color(),
        n => {
            let scale_factor = (n - 1) as f32;
            let continuous_index = (t * scale_factor).clamp(0.0, scale_factor);
            let lower = continuous_index.floor() as usize;
            let upper = continuous_index.ceil() as usize;
            if lower == upper {
                stops[lower].into_color()
            } else {
                let frac = continuous_index - lower as f32;
                stops[lower].mix(stops[upper], frac).into_color()
            }
        }
    }
}

/// Polynomial approximation of the Turbo colormap
fn turbo(t: f64) -> Srgba {
    let channel = |v: f64| (v.round().clamp(0.0, 255.0) / 255.0) as f32;
    let r = 34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66))));
    Srgba::new(channel(r), channel(g), channel(b), 1.0)
}

/// Cubehelix `(hue in degrees, saturation, lightness)` to sRGB
fn cubehelix(h: f32, s: f32, l: f32) -> Srgba {
    const A: f32 = -0.14861;
    const B: f32 = 1.78277;
    const C: f32 = -0.29227;
    const D: f32 = -0.90649;
    const E: f32 = 1.97294;
    let h = (h + 120.0).to_radians();
    let amp = s * l * (1.0 - l);
    let (sinh, cosh) = h.sin_cos();
    let r = l + amp * (A * cosh + B * sinh);
    let g = l + amp * (C * cosh + D * sinh);
    let b = l + amp * (E * cosh);
    Srgba::new(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), 1.0)
}

/// Format a color as `#rrggbb`, or `rgba(...)` when translucent
pub fn to_css(color: Srgba) -> String {
    let (r, g, b, a) = color.into_components();
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    if a >= 1.0 {
        format!("#{:02x}{:02x}{:02x}", byte(r), byte(g), byte(b))
    } else {
        format!("rgba({}, {}, {}, {})", byte(r), byte(g), byte(b), a.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<Srgba> {
        vec![Srgba::new(0.0, 0.0, 0.0, 1.0), Srgba::new(1.0, 1.0, 1.0, 1.0)]
    }

    #[test]
    fn test_ramp_endpoints_and_midpoint() {
        let interp = ColorInterpolator::ramp(stops());
        assert_eq!(interp.interpolate_css(0.0), "#000000");
        assert_eq!(interp.interpolate_css(1.0), "#ffffff");
        assert_eq!(interp.interpolate_css(0.5), "#808080");
        assert_eq!(interp.interpolate_css(2.0), "#ffffff");
    }

    #[test]
    fn test_quantize() {
        let interp = ColorInterpolator::ramp(stops());
        assert_eq!(interp.quantize(3), vec!["#000000", "#808080", "#ffffff"]);
        assert_eq!(interp.quantize(1), vec!["#808080"]);
        assert!(interp.quantize(0).is_empty());
    }

    #[test]
    fn test_turbo_endpoints() {
        assert_eq!(ColorInterpolator::Turbo.interpolate_css(0.0), "#23171b");
        assert_eq!(ColorInterpolator::Turbo.interpolate_css(1.0), "#900c00");
    }

    #[test]
    fn test_custom() {
        let interp = ColorInterpolator::Custom(Arc::new(|t| {
            Srgba::new(t as f32, 0.0, 0.0, 1.0)
        }));
        assert_eq!(interp.interpolate_css(1.0), "#ff0000");
    }

    #[test]
    fn test_translucent_css() {
        assert_eq!(
            to_css(Srgba::new(1.0, 0.0, 0.0, 0.5)),
            "rgba(255, 0, 0, 0.5)"
        );
    }
}
