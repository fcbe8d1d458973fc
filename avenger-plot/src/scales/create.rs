//! Scale construction across every mark of a plot

use std::collections::HashSet;

use avenger_scales::band::{BandScale, PointScale};
use avenger_scales::color::{
    parse_css_color, ColorInterpolator, ColorSchemeProvider, SchemeKind,
};
use avenger_scales::continuous::ContinuousScale;
use avenger_scales::error::AvengerScaleError;
use avenger_scales::ordinal::OrdinalScale;
use avenger_scales::quantile::QuantileScale;
use avenger_scales::quantize::QuantizeScale;
use avenger_scales::threshold::ThresholdScale;
use indexmap::IndexSet;

use crate::channel::{Channel, ScaleName, ScaleSpec};
use crate::classify::{
    classify_column, is_color_or_null, is_opacity_or_null, is_symbol_or_null, ColumnType,
    SYMBOLS_FILL, SYMBOLS_STROKE,
};
use crate::error::AvengerPlotError;
use crate::mark::{Mark, MarkId, MarkType};
use crate::reduce::number_or_null;
use crate::resolve::resolve_column;
use crate::scales::infer::infer_scale_type;
use crate::scales::options::{default_scale_options, PlotOptions, ScaleOptions, ScaleType};
use crate::transforms::is_synthetic;
use crate::value::{GroupKey, RawValue};

/// The mapping function of a constructed scale
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleFn {
    Continuous(ContinuousScale),
    /// Continuous scale onto `[0, 1]` followed by a color interpolator
    Color {
        scale: ContinuousScale,
        interpolator: ColorInterpolator,
    },
    Band(BandScale<GroupKey>),
    Point(PointScale<GroupKey>),
    Ordinal(OrdinalScale<GroupKey, RawValue>),
    Quantile(QuantileScale<RawValue>),
    Quantize(QuantizeScale<RawValue>),
    Threshold(ThresholdScale<RawValue>),
    Identity,
    /// Every input maps onto the same value
    Constant(RawValue),
}

impl ScaleFn {
    pub fn apply(&self, value: &RawValue) -> RawValue {
        match self {
            ScaleFn::Continuous(scale) => {
                number_or_null(scale.scale(coerce(value, scale.is_temporal())))
            }
            ScaleFn::Color {
                scale,
                interpolator,
            } => {
                let t = scale.scale(coerce(value, scale.is_temporal()));
                if t.is_finite() {
                    RawValue::String(interpolator.interpolate_css(t))
                } else {
                    RawValue::Null
                }
            }
            ScaleFn::Band(scale) => scale
                .scale(&GroupKey::from(value))
                .map_or(RawValue::Null, RawValue::Number),
            ScaleFn::Point(scale) => scale
                .scale(&GroupKey::from(value))
                .map_or(RawValue::Null, RawValue::Number),
            ScaleFn::Ordinal(scale) => scale.scale(&GroupKey::from(value)).unwrap_or_default(),
            ScaleFn::Quantile(scale) => scale.scale(value.to_f64()).unwrap_or_default(),
            ScaleFn::Quantize(scale) => scale.scale(value.to_f64()).unwrap_or_default(),
            ScaleFn::Threshold(scale) => scale.scale(value.to_f64()).unwrap_or_default(),
            ScaleFn::Identity => value.clone(),
            ScaleFn::Constant(v) => v.clone(),
        }
    }

    /// Inverse of a continuous mapping, `Null` for other scales
    pub fn invert(&self, y: f64) -> RawValue {
        match self {
            ScaleFn::Continuous(scale) => {
                let x = scale.invert(y);
                if scale.is_temporal() {
                    RawValue::from_ms(x)
                } else {
                    number_or_null(x)
                }
            }
            _ => RawValue::Null,
        }
    }

    /// Suggested ticks: nice values for continuous scales, the domain for
    /// discrete ones and the class boundaries for threshold-like ones
    pub fn ticks(&self, count: f64) -> Vec<RawValue> {
        let values = |xs: &[f64]| -> Vec<RawValue> { xs.iter().map(|x| RawValue::Number(*x)).collect() };
        match self {
            ScaleFn::Continuous(scale) | ScaleFn::Color { scale, .. } => scale
                .ticks(count)
                .into_iter()
                .map(|t| {
                    if scale.is_temporal() {
                        RawValue::from_ms(t)
                    } else {
                        RawValue::Number(t)
                    }
                })
                .collect(),
            ScaleFn::Band(scale) => scale.domain().map(RawValue::from).collect(),
            ScaleFn::Point(scale) => scale.domain().map(RawValue::from).collect(),
            ScaleFn::Ordinal(scale) => scale.domain().map(RawValue::from).collect(),
            ScaleFn::Quantile(scale) => values(scale.quantiles()),
            ScaleFn::Quantize(scale) => values(scale.thresholds()),
            ScaleFn::Threshold(scale) => values(scale.thresholds()),
            ScaleFn::Identity | ScaleFn::Constant(_) => vec![],
        }
    }

    /// Band width in pixels, 0 for everything but band scales
    pub fn bandwidth(&self) -> f64 {
        match self {
            ScaleFn::Band(scale) => scale.bandwidth(),
            _ => 0.0,
        }
    }

    /// Distance between neighbouring band or point positions
    pub fn step(&self) -> f64 {
        match self {
            ScaleFn::Band(scale) => scale.step(),
            ScaleFn::Point(scale) => scale.step(),
            _ => 0.0,
        }
    }
}

/// A constructed scale plus the metadata marks and guides need
#[derive(Debug, Clone, PartialEq)]
pub struct PlotScale {
    pub name: ScaleName,
    pub scale_type: ScaleType,
    pub domain: Vec<RawValue>,
    pub range: Vec<RawValue>,
    pub function: ScaleFn,
    /// (channel, mark) pairs whose values are rendered literally
    pub skip: HashSet<(Channel, MarkId)>,
    /// The single source field name, when there is one
    pub auto_title: Option<String>,
    pub label: Option<String>,
    pub unknown: Option<RawValue>,
}

impl PlotScale {
    pub fn apply(&self, value: &RawValue) -> RawValue {
        match (self.function.apply(value), &self.unknown) {
            (RawValue::Null, Some(unknown)) => unknown.clone(),
            (out, _) => out,
        }
    }

    pub fn is_skipped(&self, channel: Channel, mark: MarkId) -> bool {
        self.skip.contains(&(channel, mark))
    }

    /// Explicit label, falling back to the inferred title
    pub fn title(&self) -> Option<&str> {
        self.label.as_deref().or(self.auto_title.as_deref())
    }

    pub fn ticks(&self, count: f64) -> Vec<RawValue> {
        self.function.ticks(count)
    }

    pub fn bandwidth(&self) -> f64 {
        self.function.bandwidth()
    }

    /// Placeholder used when implicit scales are disabled
    fn dummy(name: ScaleName) -> Self {
        let constant = match name {
            ScaleName::Color => RawValue::from("currentColor"),
            _ => RawValue::Number(0.0),
        };
        Self {
            name,
            scale_type: ScaleType::Identity,
            domain: vec![],
            range: vec![],
            function: ScaleFn::Constant(constant),
            skip: HashSet::new(),
            auto_title: None,
            label: None,
            unknown: None,
        }
    }
}

/// Everything the marks contribute to one scale
#[derive(Debug, Default)]
struct Collected {
    values: Vec<RawValue>,
    mark_types: HashSet<MarkType>,
    fields: IndexSet<String>,
    skip: HashSet<(Channel, MarkId)>,
    preserve_order: bool,
    dot_uses_fill: bool,
}

/// Whether every value already looks like an output of scale `name`
fn is_literal_output(name: ScaleName, values: &[RawValue]) -> bool {
    let predicate: fn(&RawValue) -> bool = match name {
        ScaleName::Color => is_color_or_null,
        ScaleName::Opacity => is_opacity_or_null,
        ScaleName::Symbol => is_symbol_or_null,
        _ => return false,
    };
    values.iter().any(RawValue::is_defined) && values.iter().all(predicate)
}

fn collect(name: ScaleName, marks: &[&Mark]) -> Result<Collected, AvengerPlotError> {
    let mut collected = Collected::default();
    for mark in marks {
        if mark.mark_type() == MarkType::Dot && mark.channels().contains_key(&Channel::Fill) {
            collected.dot_uses_fill = true;
        }
        if mark.is_automatic() {
            continue;
        }

        let mut contributed = false;
        for (channel, spec) in mark.supported_channels() {
            if spec.scale == ScaleSpec::None {
                if channel.scale() == Some(name) {
                    collected.skip.insert((channel, mark.id()));
                }
                continue;
            }
            if spec.scale_name(channel) != Some(name) || mark.data().is_empty() {
                continue;
            }

            let column = resolve_column(channel, mark.data(), mark.channels())?;
            if is_literal_output(name, &column) {
                tracing::debug!(%channel, mark = ?mark.id(), "channel values are literal outputs, skipping");
                collected.skip.insert((channel, mark.id()));
                continue;
            }

            contributed = true;
            collected.mark_types.insert(mark.mark_type());
            if let Some(field) = spec.as_field().filter(|f| !is_synthetic(f)) {
                collected.fields.insert(field.to_string());
            }
            collected.values.extend(column);
        }
        if contributed && mark.has_sort() {
            collected.preserve_order = true;
        }
    }
    Ok(collected)
}

/// Numeric form of a value, reading date strings on temporal scales
fn coerce(value: &RawValue, temporal: bool) -> f64 {
    match value {
        RawValue::String(_) if temporal => value
            .as_date()
            .map_or(f64::NAN, |date| date.timestamp_millis() as f64),
        _ => value.to_f64(),
    }
}

/// Distinct defined values, sorted ascending unless order is preserved
fn ordinal_domain(values: &[RawValue], preserve_order: bool) -> Vec<RawValue> {
    let mut keys: Vec<GroupKey> = values
        .iter()
        .filter(|v| v.is_defined())
        .map(GroupKey::from)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();
    if !preserve_order {
        keys.sort();
    }
    keys.iter().map(RawValue::from).collect()
}

/// `[min, max]` of the values, optionally stretched to include zero
fn extent(values: &[RawValue], temporal: bool, zero: bool) -> [f64; 2] {
    let (mut lo, mut hi) = values
        .iter()
        .map(|v| coerce(v, temporal))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (lo, hi) = (0.0, 1.0);
    }
    if zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    [lo, hi]
}

fn numbers(values: &[RawValue]) -> Vec<f64> {
    values.iter().map(RawValue::to_f64).collect()
}

fn range_pair(range: &[RawValue]) -> Result<[f64; 2], AvengerPlotError> {
    match range {
        [a, b, ..] => Ok([a.to_f64(), b.to_f64()]),
        _ => Err(AvengerScaleError::EmptyRange.into()),
    }
}

fn continuous(
    scale_type: ScaleType,
    domain: Vec<f64>,
    range: Vec<f64>,
    temporal: bool,
    options: &ScaleOptions,
) -> Result<ContinuousScale, AvengerPlotError> {
    let scale = match scale_type {
        ScaleType::Pow | ScaleType::DivergingPow => {
            ContinuousScale::pow(domain, range, options.exponent.unwrap_or(1.0))?
        }
        ScaleType::Sqrt | ScaleType::DivergingSqrt => ContinuousScale::sqrt(domain, range)?,
        ScaleType::Log | ScaleType::DivergingLog => {
            ContinuousScale::log(domain, range, options.base.unwrap_or(10.0))?
        }
        ScaleType::Symlog | ScaleType::DivergingSymlog => {
            ContinuousScale::symlog(domain, range, options.constant.unwrap_or(1.0))?
        }
        _ if temporal => ContinuousScale::time(domain, range)?,
        _ => ContinuousScale::linear(domain, range)?,
    };
    let scale = scale.with_clamp(options.clamp).with_round(options.round);
    if options.nice.unwrap_or(false) && !scale_type.is_diverging() {
        Ok(scale.nice(options.ticks.unwrap_or(10.0)))
    } else {
        Ok(scale)
    }
}

/// Pixel range of a scale from the plot geometry
fn default_range(
    name: ScaleName,
    scale_type: ScaleType,
    options: &ScaleOptions,
    plot: &PlotOptions,
    width: f64,
    height: f64,
    dot_uses_fill: bool,
) -> Vec<RawValue> {
    let margins = &plot.margins;
    let inset = options.inset.unwrap_or(plot.inset);
    let pair = |a: f64, b: f64| vec![RawValue::Number(a), RawValue::Number(b)];
    match name {
        ScaleName::X => pair(margins.left + inset, width - margins.right - inset),
        ScaleName::Y if scale_type.is_ordinal() => {
            pair(margins.top + inset, height - margins.bottom - inset)
        }
        ScaleName::Y => pair(height - margins.bottom - inset, margins.top + inset),
        ScaleName::Fx => pair(margins.left, width - margins.right),
        ScaleName::Fy => pair(margins.top, height - margins.bottom),
        ScaleName::Opacity => pair(0.0, 1.0),
        ScaleName::R | ScaleName::Length => pair(0.0, 10.0),
        ScaleName::Symbol => {
            let palette = if dot_uses_fill {
                SYMBOLS_FILL
            } else {
                SYMBOLS_STROKE
            };
            palette
                .iter()
                .map(|s| RawValue::Symbol(s.to_string()))
                .collect()
        }
        // Color ranges come from schemes
        ScaleName::Color => vec![],
    }
}

/// Diverging domain centred on the pivot
fn diverging_domain(scale_type: ScaleType, [lo, hi]: [f64; 2], pivot: Option<f64>) -> Vec<f64> {
    if scale_type == ScaleType::DivergingLog {
        let pivot = pivot.unwrap_or(1.0);
        return vec![lo.min(pivot), pivot, hi.max(pivot)];
    }
    let pivot = pivot.unwrap_or(0.0);
    let m = (lo - pivot).abs().max((hi - pivot).abs());
    vec![pivot - m, pivot, pivot + m]
}

fn color_strings(colors: Vec<String>) -> Vec<RawValue> {
    colors.into_iter().map(RawValue::String).collect()
}

/// Build the scale `name` from every mark of a plot.
///
/// Errors when the requested type is not valid for `name`, when a color
/// scheme is unknown or when the underlying scale rejects its domain/range.
#[tracing::instrument(skip_all, fields(scale = %name))]
pub fn create_scale(
    name: ScaleName,
    options: Option<&ScaleOptions>,
    marks: &[&Mark],
    plot: &PlotOptions,
    width: f64,
    height: f64,
    schemes: &dyn ColorSchemeProvider,
) -> Result<PlotScale, AvengerPlotError> {
    if !plot.implicit_scales && options.is_none() {
        return Ok(PlotScale::dummy(name));
    }
    let mut options = options.cloned().unwrap_or_default();
    let collected = collect(name, marks)?;

    let scale_type = match options.scale_type {
        ScaleType::Auto => {
            let inferred = infer_scale_type(name, &collected.values, &collected.mark_types);
            let inferred = match &options.scheme {
                Some(scheme)
                    if name == ScaleName::Color
                        && inferred == ScaleType::Linear
                        && schemes.kind(scheme) == Some(SchemeKind::Diverging) =>
                {
                    ScaleType::Diverging
                }
                _ => inferred,
            };
            tracing::debug!(scale_type = %inferred, values = collected.values.len(), "inferred scale type");
            inferred
        }
        explicit => explicit,
    };
    scale_type.validate(name)?;
    options.apply_defaults_if_not_set(&default_scale_options(scale_type, name.into()));

    let source = options.domain.as_deref().unwrap_or(&collected.values);
    let temporal = scale_type == ScaleType::Time || classify_column(source) == ColumnType::Date;
    let zero = options.zero.unwrap_or(false);

    let mut domain: Vec<RawValue> = match scale_type {
        ScaleType::Identity => options.domain.clone().unwrap_or_default(),
        t if t.is_ordinal() => options
            .domain
            .clone()
            .unwrap_or_else(|| ordinal_domain(&collected.values, collected.preserve_order)),
        ScaleType::Quantile => {
            let mut samples: Vec<f64> = source
                .iter()
                .map(RawValue::to_f64)
                .filter(|v| v.is_finite())
                .collect();
            samples.sort_by(f64::total_cmp);
            samples.into_iter().map(RawValue::Number).collect()
        }
        ScaleType::Threshold => options
            .domain
            .clone()
            .unwrap_or_else(|| vec![RawValue::Number(0.0)]),
        t if t.is_diverging() => {
            diverging_domain(t, extent(source, false, zero), options.pivot)
                .into_iter()
                .map(RawValue::Number)
                .collect()
        }
        _ => extent(source, temporal, zero)
            .into_iter()
            .map(|v| {
                if temporal {
                    RawValue::from_ms(v)
                } else {
                    RawValue::Number(v)
                }
            })
            .collect(),
    };

    let mut range = options.range.clone().unwrap_or_else(|| {
        default_range(
            name,
            scale_type,
            &options,
            plot,
            width,
            height,
            collected.dot_uses_fill,
        )
    });

    let function = if name == ScaleName::Color && scale_type != ScaleType::Identity {
        let scheme = options
            .scheme
            .clone()
            .unwrap_or_else(|| "observable10".to_string());
        match scale_type {
            ScaleType::Ordinal | ScaleType::Categorical => {
                if range.is_empty() {
                    range = color_strings(schemes.discrete(&scheme, domain.len().max(1))?);
                }
                if options.reverse {
                    range.reverse();
                }
                let keys = domain.iter().map(GroupKey::from).collect();
                let mut scale = OrdinalScale::new(keys, range.clone())?;
                if let Some(unknown) = &options.unknown {
                    scale = scale.with_unknown(unknown.clone());
                }
                if scale.wraps() {
                    tracing::warn!(
                        domain = domain.len(),
                        colors = range.len(),
                        "ordinal color domain exceeds the scheme, colors will repeat"
                    );
                }
                ScaleFn::Ordinal(scale)
            }
            ScaleType::Quantile | ScaleType::Quantize | ScaleType::Threshold => {
                if range.is_empty() {
                    let n = match scale_type {
                        ScaleType::Threshold => domain.len() + 1,
                        _ => options.ticks.unwrap_or(5.0).max(1.0) as usize,
                    };
                    range = color_strings(schemes.discrete(&scheme, n)?);
                }
                if options.reverse {
                    range.reverse();
                }
                match scale_type {
                    ScaleType::Quantile => {
                        ScaleFn::Quantile(QuantileScale::new(numbers(&domain), range.clone())?)
                    }
                    ScaleType::Quantize => {
                        let [lo, hi] = range_pair(&domain)?;
                        ScaleFn::Quantize(QuantizeScale::new([lo, hi], range.clone())?)
                    }
                    _ => ScaleFn::Threshold(ThresholdScale::new(numbers(&domain), range.clone())?),
                }
            }
            _ => {
                let interpolator = if range.is_empty() {
                    schemes.interpolator(&scheme)?
                } else {
                    let stops = range
                        .iter()
                        .map(|c| parse_css_color(c.as_str().unwrap_or_default()))
                        .collect::<Result<Vec<_>, _>>()?;
                    ColorInterpolator::ramp(stops)
                };
                let mut stops: Vec<f64> = if scale_type.is_diverging() {
                    vec![0.0, 0.5, 1.0]
                } else {
                    vec![0.0, 1.0]
                };
                if options.reverse {
                    stops.reverse();
                }
                let scale = continuous(scale_type, numbers(&domain), stops.clone(), temporal, &options)?;
                range = stops
                    .iter()
                    .map(|t| RawValue::String(interpolator.interpolate_css(*t)))
                    .collect();
                domain = rebuild_domain(&scale);
                ScaleFn::Color {
                    scale,
                    interpolator,
                }
            }
        }
    } else {
        if options.reverse {
            range.reverse();
        }
        match scale_type {
            ScaleType::Identity => ScaleFn::Identity,
            ScaleType::Band => {
                let keys = domain.iter().map(GroupKey::from).collect();
                let scale = BandScale::new(keys, range_pair(&range)?)
                    .with_padding_inner(options.padding.or(options.padding_inner).unwrap_or(0.1))?
                    .with_padding_outer(options.padding.or(options.padding_outer).unwrap_or(0.1))?
                    .with_align(options.align.unwrap_or(0.5))?
                    .with_round(options.round);
                ScaleFn::Band(scale)
            }
            ScaleType::Point => {
                let keys = domain.iter().map(GroupKey::from).collect();
                let scale = PointScale::new(keys, range_pair(&range)?)
                    .with_padding(options.padding.unwrap_or(0.5))?
                    .with_align(options.align.unwrap_or(0.5))?
                    .with_round(options.round);
                ScaleFn::Point(scale)
            }
            ScaleType::Ordinal | ScaleType::Categorical => {
                let keys = domain.iter().map(GroupKey::from).collect();
                let mut scale = OrdinalScale::new(keys, range.clone())?;
                if let Some(unknown) = &options.unknown {
                    scale = scale.with_unknown(unknown.clone());
                }
                ScaleFn::Ordinal(scale)
            }
            _ => {
                let scale = continuous(
                    scale_type,
                    domain.iter().map(|v| coerce(v, temporal)).collect(),
                    numbers(&range),
                    temporal,
                    &options,
                )?;
                domain = rebuild_domain(&scale);
                ScaleFn::Continuous(scale)
            }
        }
    };

    let auto_title = match collected.fields.len() {
        1 => collected.fields.first().map(|field| {
            if matches!(scale_type, ScaleType::Log | ScaleType::DivergingLog) {
                format!("{field} (log)")
            } else {
                field.clone()
            }
        }),
        _ => None,
    };

    Ok(PlotScale {
        name,
        scale_type,
        domain,
        range,
        function,
        skip: collected.skip,
        auto_title,
        label: options.label.clone(),
        unknown: options.unknown.clone(),
    })
}

/// Domain after nicing, as dates for temporal scales
fn rebuild_domain(scale: &ContinuousScale) -> Vec<RawValue> {
    scale
        .domain()
        .iter()
        .map(|v| {
            if scale.is_temporal() {
                RawValue::from_ms(*v)
            } else {
                RawValue::Number(*v)
            }
        })
        .collect()
}
