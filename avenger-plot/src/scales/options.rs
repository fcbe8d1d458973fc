//! Typed scale and plot options with JSON-loadable partial overrides

use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString, VariantNames};

use crate::channel::ScaleName;
use crate::error::AvengerPlotError;
use crate::value::RawValue;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    VariantNames,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ScaleType {
    /// Inferred from the collected values
    #[default]
    Auto,
    Linear,
    Pow,
    Sqrt,
    Log,
    Symlog,
    Time,
    Band,
    Point,
    Ordinal,
    Categorical,
    Sequential,
    Diverging,
    DivergingLog,
    DivergingPow,
    DivergingSqrt,
    DivergingSymlog,
    Quantile,
    Quantize,
    Threshold,
    Identity,
}

impl ScaleType {
    pub fn is_ordinal(&self) -> bool {
        matches!(
            self,
            ScaleType::Band | ScaleType::Point | ScaleType::Ordinal | ScaleType::Categorical
        )
    }

    pub fn is_diverging(&self) -> bool {
        matches!(
            self,
            ScaleType::Diverging
                | ScaleType::DivergingLog
                | ScaleType::DivergingPow
                | ScaleType::DivergingSqrt
                | ScaleType::DivergingSymlog
        )
    }

    /// Types whose domain is a `[min, max]` extent
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            ScaleType::Linear
                | ScaleType::Pow
                | ScaleType::Sqrt
                | ScaleType::Log
                | ScaleType::Symlog
                | ScaleType::Time
                | ScaleType::Sequential
                | ScaleType::Quantize
        ) || self.is_diverging()
    }

    /// Scale types a scale name accepts
    pub fn allowed_for(name: ScaleName) -> &'static [ScaleType] {
        use ScaleType::*;
        match name {
            ScaleName::X | ScaleName::Y => &[
                Auto, Linear, Pow, Sqrt, Log, Symlog, Time, Band, Point, Identity,
            ],
            ScaleName::Fx | ScaleName::Fy => &[Auto, Band, Identity],
            ScaleName::R | ScaleName::Opacity | ScaleName::Length => {
                &[Auto, Linear, Pow, Sqrt, Log, Symlog, Identity]
            }
            ScaleName::Symbol => &[Auto, Ordinal, Categorical, Identity],
            ScaleName::Color => &[
                Auto,
                Linear,
                Pow,
                Sqrt,
                Log,
                Symlog,
                Time,
                Ordinal,
                Categorical,
                Sequential,
                Diverging,
                DivergingLog,
                DivergingPow,
                DivergingSqrt,
                DivergingSymlog,
                Quantile,
                Quantize,
                Threshold,
                Identity,
            ],
        }
    }

    pub fn validate(&self, name: ScaleName) -> Result<(), AvengerPlotError> {
        let allowed = Self::allowed_for(name);
        if allowed.contains(self) {
            Ok(())
        } else {
            Err(AvengerPlotError::InvalidScaleType {
                scale: name.to_string(),
                scale_type: self.to_string(),
                allowed: allowed
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}

/// Options for one scale. `None` fields take a default chosen from the
/// scale type and the scale name once the type is known.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleOptions {
    pub scale_type: ScaleType,
    pub domain: Option<Vec<RawValue>>,
    pub range: Option<Vec<RawValue>>,
    pub reverse: bool,
    /// Force zero into continuous domains
    pub zero: Option<bool>,
    pub nice: Option<bool>,
    pub clamp: bool,
    pub round: bool,
    /// Pixels removed from both ends of a positional range, overriding the
    /// plot inset
    pub inset: Option<f64>,
    pub padding: Option<f64>,
    pub padding_inner: Option<f64>,
    pub padding_outer: Option<f64>,
    pub align: Option<f64>,
    pub scheme: Option<String>,
    /// Center of diverging scales
    pub pivot: Option<f64>,
    /// Log base
    pub base: Option<f64>,
    /// Pow exponent
    pub exponent: Option<f64>,
    /// Symlog constant
    pub constant: Option<f64>,
    pub unknown: Option<RawValue>,
    pub label: Option<String>,
    /// Tick count hint, also the class count of quantile and quantize scales
    pub ticks: Option<f64>,
}

impl ScaleOptions {
    pub fn of_type(scale_type: ScaleType) -> Self {
        Self {
            scale_type,
            ..Default::default()
        }
    }

    pub fn with_domain<V: Into<RawValue>>(mut self, domain: impl IntoIterator<Item = V>) -> Self {
        self.domain = Some(domain.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_range<V: Into<RawValue>>(mut self, range: impl IntoIterator<Item = V>) -> Self {
        self.range = Some(range.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_zero(mut self, zero: bool) -> Self {
        self.zero = Some(zero);
        self
    }

    pub fn with_nice(mut self, nice: bool) -> Self {
        self.nice = Some(nice);
        self
    }

    /// Fill every unset option from `defaults`
    pub fn apply_defaults_if_not_set(&mut self, defaults: &ScaleOptionsOverride) {
        fn fill<T: Clone>(slot: &mut Option<T>, default: &Option<T>) {
            if slot.is_none() {
                *slot = default.clone();
            }
        }
        fill(&mut self.zero, &defaults.zero);
        fill(&mut self.nice, &defaults.nice);
        fill(&mut self.padding, &defaults.padding);
        fill(&mut self.padding_inner, &defaults.padding_inner);
        fill(&mut self.padding_outer, &defaults.padding_outer);
        fill(&mut self.align, &defaults.align);
        fill(&mut self.scheme, &defaults.scheme);
    }
}

/// Which role a scale plays, for choosing defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleUsageContext {
    XPosition,
    YPosition,
    Color,
    Size,
    General,
}

impl From<ScaleName> for ScaleUsageContext {
    fn from(name: ScaleName) -> Self {
        match name {
            ScaleName::X | ScaleName::Fx => ScaleUsageContext::XPosition,
            ScaleName::Y | ScaleName::Fy => ScaleUsageContext::YPosition,
            ScaleName::Color => ScaleUsageContext::Color,
            ScaleName::R | ScaleName::Length => ScaleUsageContext::Size,
            ScaleName::Opacity | ScaleName::Symbol => ScaleUsageContext::General,
        }
    }
}

/// Default options for a resolved scale type in a usage context
pub fn default_scale_options(
    scale_type: ScaleType,
    context: ScaleUsageContext,
) -> ScaleOptionsOverride {
    let mut options = ScaleOptionsOverride::default();
    match (scale_type, context) {
        (ScaleType::Linear, ScaleUsageContext::YPosition) => {
            options.zero = Some(true);
            options.nice = Some(true);
        }
        (ScaleType::Linear, ScaleUsageContext::XPosition) => {
            options.nice = Some(true);
        }
        (
            ScaleType::Log | ScaleType::Pow | ScaleType::Sqrt,
            ScaleUsageContext::XPosition | ScaleUsageContext::YPosition,
        ) => {
            options.nice = Some(true);
        }
        (ScaleType::Band, _) => {
            options.padding_inner = Some(0.1);
            options.padding_outer = Some(0.1);
            options.align = Some(0.5);
        }
        (ScaleType::Point, _) => {
            options.padding = Some(0.5);
            options.align = Some(0.5);
        }
        (ScaleType::Ordinal | ScaleType::Categorical, ScaleUsageContext::Color) => {
            options.scheme = Some("observable10".to_string());
        }
        (
            ScaleType::Linear
            | ScaleType::Pow
            | ScaleType::Sqrt
            | ScaleType::Log
            | ScaleType::Symlog
            | ScaleType::Time
            | ScaleType::Sequential,
            ScaleUsageContext::Color,
        ) => {
            options.scheme = Some("turbo".to_string());
        }
        (t, ScaleUsageContext::Color) if t.is_diverging() => {
            options.scheme = Some("rdbu".to_string());
        }
        (
            ScaleType::Quantile | ScaleType::Quantize | ScaleType::Threshold,
            ScaleUsageContext::Color,
        ) => {
            options.scheme = Some("rdylbu".to_string());
        }
        _ => {}
    }
    options
}

/// Partial scale options, e.g. loaded from JSON. Present fields replace the
/// corresponding [`ScaleOptions`] fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScaleOptionsOverride {
    #[serde(rename = "type")]
    pub scale_type: Option<ScaleType>,
    pub domain: Option<Vec<Value>>,
    pub range: Option<Vec<Value>>,
    pub reverse: Option<bool>,
    pub zero: Option<bool>,
    pub nice: Option<bool>,
    pub clamp: Option<bool>,
    pub round: Option<bool>,
    pub inset: Option<f64>,
    pub padding: Option<f64>,
    pub padding_inner: Option<f64>,
    pub padding_outer: Option<f64>,
    pub align: Option<f64>,
    pub scheme: Option<String>,
    pub pivot: Option<f64>,
    pub base: Option<f64>,
    pub exponent: Option<f64>,
    pub constant: Option<f64>,
    pub unknown: Option<Value>,
    pub label: Option<String>,
    pub ticks: Option<f64>,
}

impl ScaleOptionsOverride {
    pub fn apply(&self, options: &mut ScaleOptions) {
        let values = |v: &Vec<Value>| v.iter().map(RawValue::from).collect::<Vec<_>>();
        if let Some(t) = self.scale_type {
            options.scale_type = t;
        }
        if let Some(domain) = &self.domain {
            options.domain = Some(values(domain));
        }
        if let Some(range) = &self.range {
            options.range = Some(values(range));
        }
        if let Some(reverse) = self.reverse {
            options.reverse = reverse;
        }
        if let Some(clamp) = self.clamp {
            options.clamp = clamp;
        }
        if let Some(round) = self.round {
            options.round = round;
        }
        if let Some(unknown) = &self.unknown {
            options.unknown = Some(RawValue::from(unknown));
        }
        replace(&mut options.zero, self.zero);
        replace(&mut options.nice, self.nice);
        replace(&mut options.inset, self.inset);
        replace(&mut options.padding, self.padding);
        replace(&mut options.padding_inner, self.padding_inner);
        replace(&mut options.padding_outer, self.padding_outer);
        replace(&mut options.align, self.align);
        replace(&mut options.scheme, self.scheme.clone());
        replace(&mut options.pivot, self.pivot);
        replace(&mut options.base, self.base);
        replace(&mut options.exponent, self.exponent);
        replace(&mut options.constant, self.constant);
        replace(&mut options.label, self.label.clone());
        replace(&mut options.ticks, self.ticks);
    }
}

fn replace<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

/// Plot-wide options
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    /// Pixels removed from both ends of the x and y ranges
    pub inset: f64,
    /// Create scales for channels that have no explicit scale options
    pub implicit_scales: bool,
    pub x: Option<ScaleOptions>,
    pub y: Option<ScaleOptions>,
    pub r: Option<ScaleOptions>,
    pub color: Option<ScaleOptions>,
    pub opacity: Option<ScaleOptions>,
    pub symbol: Option<ScaleOptions>,
    pub length: Option<ScaleOptions>,
    pub fx: Option<ScaleOptions>,
    pub fy: Option<ScaleOptions>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 400.0,
            margins: Margins::default(),
            inset: 0.0,
            implicit_scales: true,
            x: None,
            y: None,
            r: None,
            color: None,
            opacity: None,
            symbol: None,
            length: None,
            fx: None,
            fy: None,
        }
    }
}

impl PlotOptions {
    pub fn scale(&self, name: ScaleName) -> Option<&ScaleOptions> {
        self.scale_slot(name).as_ref()
    }

    pub fn with_scale(mut self, name: ScaleName, options: ScaleOptions) -> Self {
        *self.scale_slot_mut(name) = Some(options);
        self
    }

    fn scale_slot(&self, name: ScaleName) -> &Option<ScaleOptions> {
        match name {
            ScaleName::X => &self.x,
            ScaleName::Y => &self.y,
            ScaleName::R => &self.r,
            ScaleName::Color => &self.color,
            ScaleName::Opacity => &self.opacity,
            ScaleName::Symbol => &self.symbol,
            ScaleName::Length => &self.length,
            ScaleName::Fx => &self.fx,
            ScaleName::Fy => &self.fy,
        }
    }

    fn scale_slot_mut(&mut self, name: ScaleName) -> &mut Option<ScaleOptions> {
        match name {
            ScaleName::X => &mut self.x,
            ScaleName::Y => &mut self.y,
            ScaleName::R => &mut self.r,
            ScaleName::Color => &mut self.color,
            ScaleName::Opacity => &mut self.opacity,
            ScaleName::Symbol => &mut self.symbol,
            ScaleName::Length => &mut self.length,
            ScaleName::Fx => &mut self.fx,
            ScaleName::Fy => &mut self.fy,
        }
    }
}

/// Partial plot options. Each scale override is applied onto the existing
/// scale options, creating them when absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlotOptionsOverride {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub margin: Option<f64>,
    pub margin_top: Option<f64>,
    pub margin_right: Option<f64>,
    pub margin_bottom: Option<f64>,
    pub margin_left: Option<f64>,
    pub inset: Option<f64>,
    pub implicit_scales: Option<bool>,
    pub x: Option<ScaleOptionsOverride>,
    pub y: Option<ScaleOptionsOverride>,
    pub r: Option<ScaleOptionsOverride>,
    pub color: Option<ScaleOptionsOverride>,
    pub opacity: Option<ScaleOptionsOverride>,
    pub symbol: Option<ScaleOptionsOverride>,
    pub length: Option<ScaleOptionsOverride>,
    pub fx: Option<ScaleOptionsOverride>,
    pub fy: Option<ScaleOptionsOverride>,
}

impl PlotOptionsOverride {
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn apply(&self, options: &mut PlotOptions) {
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(margin) = self.margin {
            options.margins = Margins {
                top: margin,
                right: margin,
                bottom: margin,
                left: margin,
            };
        }
        let margins = &mut options.margins;
        for (slot, value) in [
            (&mut margins.top, self.margin_top),
            (&mut margins.right, self.margin_right),
            (&mut margins.bottom, self.margin_bottom),
            (&mut margins.left, self.margin_left),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(inset) = self.inset {
            options.inset = inset;
        }
        if let Some(implicit) = self.implicit_scales {
            options.implicit_scales = implicit;
        }

        for (name, scale) in [
            (ScaleName::X, &self.x),
            (ScaleName::Y, &self.y),
            (ScaleName::R, &self.r),
            (ScaleName::Color, &self.color),
            (ScaleName::Opacity, &self.opacity),
            (ScaleName::Symbol, &self.symbol),
            (ScaleName::Length, &self.length),
            (ScaleName::Fx, &self.fx),
            (ScaleName::Fy, &self.fy),
        ] {
            if let Some(scale) = scale {
                scale.apply(options.scale_slot_mut(name).get_or_insert_with(Default::default));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_scale_type_names() {
        assert_eq!(ScaleType::from_str("diverging-log").unwrap(), ScaleType::DivergingLog);
        assert_eq!(ScaleType::Symlog.to_string(), "symlog");
        assert!(ScaleType::VARIANTS.contains(&"quantize"));
    }

    #[test]
    fn test_allowlist_error_lists_types() {
        let err = ScaleType::Band.validate(ScaleName::Color).unwrap_err();
        match err {
            AvengerPlotError::InvalidScaleType {
                scale,
                scale_type,
                allowed,
            } => {
                assert_eq!(scale, "color");
                assert_eq!(scale_type, "band");
                assert!(allowed.contains("categorical"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ScaleType::Band.validate(ScaleName::X).is_ok());
        assert!(ScaleType::Log.validate(ScaleName::Symbol).is_err());
    }

    #[test]
    fn test_linear_y_defaults() {
        let defaults = default_scale_options(ScaleType::Linear, ScaleUsageContext::YPosition);
        assert_eq!(defaults.zero, Some(true));
        assert_eq!(defaults.nice, Some(true));
        let defaults = default_scale_options(ScaleType::Linear, ScaleUsageContext::XPosition);
        assert_eq!(defaults.zero, None);
    }

    #[test]
    fn test_apply_defaults_preserves_existing() {
        let mut options = ScaleOptions::default().with_zero(false);
        let defaults = default_scale_options(ScaleType::Linear, ScaleUsageContext::YPosition);
        options.apply_defaults_if_not_set(&defaults);
        assert_eq!(options.zero, Some(false));
        assert_eq!(options.nice, Some(true));
    }

    #[test]
    fn test_plot_override_from_json() {
        let over = PlotOptionsOverride::from_json(&json!({
            "width": 300,
            "marginLeft": 60,
            "x": {"type": "log", "domain": [1, 1000], "base": 2},
            "color": {"scheme": "viridis", "reverse": true}
        }))
        .unwrap();
        let mut options = PlotOptions::default();
        over.apply(&mut options);
        assert_eq!(options.width, 300.0);
        assert_eq!(options.margins.left, 60.0);
        assert_eq!(options.margins.top, 20.0);
        let x = options.scale(ScaleName::X).unwrap();
        assert_eq!(x.scale_type, ScaleType::Log);
        assert_eq!(
            x.domain,
            Some(vec![RawValue::from(1.0), RawValue::from(1000.0)])
        );
        assert_eq!(x.base, Some(2.0));
        let color = options.scale(ScaleName::Color).unwrap();
        assert!(color.reverse);
        assert_eq!(color.scheme.as_deref(), Some("viridis"));
        assert!(options.scale(ScaleName::Y).is_none());
    }

    #[test]
    fn test_unknown_override_field_is_rejected() {
        assert!(PlotOptionsOverride::from_json(&json!({"widht": 3})).is_err());
        assert!(PlotOptionsOverride::from_json(&json!({"x": {"type": "bogus"}})).is_err());
    }
}
