//! The plot container: registered marks, options and the scale cache

use std::sync::Arc;

use avenger_scales::color::{BuiltinSchemes, ColorSchemeProvider};
use indexmap::IndexMap;

use crate::channel::{Channel, ScaleName, ScaleSpec};
use crate::error::AvengerPlotError;
use crate::layout::{plot_area, FacetGrid, Rect};
use crate::mark::{Mark, MarkId};
use crate::scales::{create_scale, PlotOptions, PlotOptionsOverride, PlotScale};

/// Facet scales come first so the position scales can be laid out in a cell
const SCALE_ORDER: [ScaleName; 9] = [
    ScaleName::Fx,
    ScaleName::Fy,
    ScaleName::X,
    ScaleName::Y,
    ScaleName::R,
    ScaleName::Color,
    ScaleName::Opacity,
    ScaleName::Symbol,
    ScaleName::Length,
];

pub type Scales = IndexMap<ScaleName, PlotScale>;

/// Owns the marks of one plot and derives its scales.
///
/// Scales are computed on first access after any change to marks, options or
/// size, and reused until the next change.
#[derive(Clone)]
pub struct Plot {
    options: PlotOptions,
    marks: IndexMap<MarkId, Mark>,
    schemes: Arc<dyn ColorSchemeProvider>,
    scales: Option<Scales>,
}

impl Default for Plot {
    fn default() -> Self {
        Self::new(PlotOptions::default())
    }
}

impl Plot {
    pub fn new(options: PlotOptions) -> Self {
        Self {
            options,
            marks: IndexMap::new(),
            schemes: Arc::new(BuiltinSchemes),
            scales: None,
        }
    }

    /// Replace the color scheme provider
    pub fn with_schemes(mut self, schemes: Arc<dyn ColorSchemeProvider>) -> Self {
        self.schemes = schemes;
        self.scales = None;
        self
    }

    pub fn options(&self) -> &PlotOptions {
        &self.options
    }

    pub fn width(&self) -> f64 {
        self.options.width
    }

    pub fn height(&self) -> f64 {
        self.options.height
    }

    pub fn marks(&self) -> impl Iterator<Item = &Mark> {
        self.marks.values()
    }

    pub fn mark(&self, id: MarkId) -> Option<&Mark> {
        self.marks.get(&id)
    }

    pub fn add_mark(&mut self, mark: Mark) -> MarkId {
        let id = mark.id();
        self.marks.insert(id, mark);
        self.scales = None;
        id
    }

    /// Replace the mark registered as `id`, keeping its identity. Returns
    /// whether anything changed; an equal mark leaves the cache intact.
    pub fn update_mark(&mut self, id: MarkId, mark: Mark) -> bool {
        let mark = mark.with_id(id);
        match self.marks.get_mut(&id) {
            Some(existing) if *existing == mark => false,
            Some(existing) => {
                *existing = mark;
                self.scales = None;
                true
            }
            None => false,
        }
    }

    pub fn remove_mark(&mut self, id: MarkId) -> Option<Mark> {
        let removed = self.marks.shift_remove(&id);
        if removed.is_some() {
            self.scales = None;
        }
        removed
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        if self.options.width != width || self.options.height != height {
            self.options.width = width;
            self.options.height = height;
            self.scales = None;
        }
    }

    pub fn set_options(&mut self, options: PlotOptions) {
        if self.options != options {
            self.options = options;
            self.scales = None;
        }
    }

    pub fn apply_override(&mut self, partial: &PlotOptionsOverride) {
        let mut options = self.options.clone();
        partial.apply(&mut options);
        self.set_options(options);
    }

    /// Scales mapped by some mark channel or configured in the options
    fn required_scales(&self) -> Vec<ScaleName> {
        SCALE_ORDER
            .into_iter()
            .filter(|name| {
                self.options.scale(*name).is_some()
                    || self.marks.values().any(|mark| {
                        mark.supported_channels()
                            .any(|(channel, spec)| spec.scale_name(channel) == Some(*name))
                    })
            })
            .collect()
    }

    #[tracing::instrument(skip_all, fields(marks = self.marks.len()))]
    fn compute_scales(&self) -> Result<Scales, AvengerPlotError> {
        let marks: Vec<&Mark> = self.marks.values().collect();
        let (width, height) = (self.options.width, self.options.height);
        let mut scales = Scales::new();

        let required = self.required_scales();
        for name in [ScaleName::Fx, ScaleName::Fy] {
            if required.contains(&name) {
                let scale = create_scale(
                    name,
                    self.options.scale(name),
                    &marks,
                    &self.options,
                    width,
                    height,
                    self.schemes.as_ref(),
                )?;
                scales.insert(name, scale);
            }
        }

        let grid = FacetGrid::new(
            scales.get(&ScaleName::Fx),
            scales.get(&ScaleName::Fy),
            plot_area(&self.options, width, height),
        );
        let (cell_options, cell_width, cell_height) = if grid.is_faceted() {
            grid.cell_options(&self.options)
        } else {
            (self.options.clone(), width, height)
        };

        for name in required
            .into_iter()
            .filter(|n| !matches!(n, ScaleName::Fx | ScaleName::Fy))
        {
            let (plot, w, h) = match name {
                ScaleName::X | ScaleName::Y => (&cell_options, cell_width, cell_height),
                _ => (&self.options, width, height),
            };
            let scale = create_scale(
                name,
                self.options.scale(name),
                &marks,
                plot,
                w,
                h,
                self.schemes.as_ref(),
            )?;
            scales.insert(name, scale);
        }
        Ok(scales)
    }

    /// Every scale of the plot, recomputed when stale
    pub fn scales(&mut self) -> Result<&Scales, AvengerPlotError> {
        if self.scales.is_some() {
            tracing::debug!("reusing cached scales");
        } else {
            self.scales = Some(self.compute_scales()?);
        }
        Ok(self.scales.get_or_insert_with(Scales::new))
    }

    pub fn scale(&mut self, name: ScaleName) -> Result<Option<&PlotScale>, AvengerPlotError> {
        Ok(self.scales()?.get(&name))
    }

    /// For each scaled channel of mark `id`, whether its values go through
    /// the scale (`true`) or are rendered literally (`false`)
    pub fn used_scales(&mut self, id: MarkId) -> Result<IndexMap<Channel, bool>, AvengerPlotError> {
        self.scales()?;
        let (Some(mark), Some(scales)) = (self.marks.get(&id), self.scales.as_ref()) else {
            return Ok(IndexMap::new());
        };
        Ok(mark
            .supported_channels()
            .filter_map(|(channel, spec)| {
                if spec.scale == ScaleSpec::None {
                    return channel.scale().map(|_| (channel, false));
                }
                let name = spec.scale_name(channel)?;
                let used = scales
                    .get(&name)
                    .is_some_and(|scale| !scale.is_skipped(channel, id));
                Some((channel, used))
            })
            .collect())
    }

    /// Facet cells, a single cell spanning the plot area when not faceted
    pub fn facet_grid(&mut self) -> Result<FacetGrid, AvengerPlotError> {
        let area = self.plot_area();
        let scales = self.scales()?;
        Ok(FacetGrid::new(
            scales.get(&ScaleName::Fx),
            scales.get(&ScaleName::Fy),
            area,
        ))
    }

    pub fn plot_area(&self) -> Rect {
        plot_area(&self.options, self.options.width, self.options.height)
    }
}
