//! Color scheme provider: named discrete schemes and continuous
//! `[0, 1] -> color` interpolators.

pub mod coerce;
pub mod interpolator;
pub mod schemes;

pub use coerce::{is_css_color, parse_css_color};
pub use interpolator::{to_css, ColorInterpolator, InterpolationSpace};
pub use schemes::{is_diverging_scheme, normalize_scheme_name, scheme_kind, SchemeKind};

use crate::error::AvengerScaleError;
use schemes::{lookup_scheme, unpack, SchemeData};

/// Source of named color schemes. Implementations must report unknown
/// names as errors rather than substituting a default.
pub trait ColorSchemeProvider: Send + Sync {
    /// Kind of the named scheme, `None` when unknown
    fn kind(&self, name: &str) -> Option<SchemeKind>;

    /// `n` colors for ordinal use. Categorical schemes return their fixed
    /// colors (at most `n`), continuous schemes are sampled evenly.
    fn discrete(&self, name: &str, n: usize) -> Result<Vec<String>, AvengerScaleError>;

    /// Continuous interpolator for the named scheme
    fn interpolator(&self, name: &str) -> Result<ColorInterpolator, AvengerScaleError>;
}

/// Built in ColorBrewer, Tableau, Observable and matplotlib schemes
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSchemes;

impl ColorSchemeProvider for BuiltinSchemes {
    fn kind(&self, name: &str) -> Option<SchemeKind> {
        scheme_kind(name)
    }

    fn discrete(&self, name: &str, n: usize) -> Result<Vec<String>, AvengerScaleError> {
        match lookup_scheme(name) {
            Some((_, SchemeData::Discrete(packed))) => {
                let mut colors = unpack(packed);
                if n > 0 && n < colors.len() {
                    colors.truncate(n);
                }
                Ok(colors)
            }
            Some(_) => Ok(self.interpolator(name)?.quantize(n)),
            None => Err(AvengerScaleError::UnknownColorScheme(name.to_string())),
        }
    }

    fn interpolator(&self, name: &str) -> Result<ColorInterpolator, AvengerScaleError> {
        let Some((_, data)) = lookup_scheme(name) else {
            return Err(AvengerScaleError::UnknownColorScheme(name.to_string()));
        };
        let interp = match data {
            SchemeData::Discrete(packed) | SchemeData::Ramp(packed) => {
                let stops = unpack(packed)
                    .iter()
                    .map(|hex| coerce::parse_hex(hex))
                    .collect::<Result<Vec<_>, _>>()?;
                ColorInterpolator::ramp(stops)
            }
            SchemeData::Turbo => ColorInterpolator::Turbo,
            SchemeData::Warm => ColorInterpolator::Cubehelix {
                start: [-100.0, 0.75, 0.35],
                end: [80.0, 1.5, 0.8],
            },
            SchemeData::Cool => ColorInterpolator::Cubehelix {
                start: [260.0, 0.75, 0.35],
                end: [80.0, 1.5, 0.8],
            },
        };
        Ok(interp)
    }
}
