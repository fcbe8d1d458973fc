//! Plot area and facet grid geometry

use std::collections::HashSet;

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::mark::Mark;
use crate::resolve::resolve_channel;
use crate::scales::{Margins, PlotOptions, PlotScale};
use crate::value::{GroupKey, RawValue};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The frame left inside the margins
pub fn plot_area(options: &PlotOptions, width: f64, height: f64) -> Rect {
    let m = &options.margins;
    Rect {
        x: m.left,
        y: m.top,
        width: (width - m.left - m.right).max(0.0),
        height: (height - m.top - m.bottom).max(0.0),
    }
}

/// One panel of a faceted plot
#[derive(Debug, Clone, PartialEq)]
pub struct FacetCell {
    pub fx: RawValue,
    pub fy: RawValue,
    pub frame: Rect,
}

/// Panels laid out by the `fx` and `fy` band scales. Without a facet scale
/// the corresponding dimension has a single `Null` entry spanning the plot
/// area.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetGrid {
    pub columns: Vec<RawValue>,
    pub rows: Vec<RawValue>,
    pub cell_width: f64,
    pub cell_height: f64,
    cells: Vec<FacetCell>,
}

impl FacetGrid {
    pub fn new(fx: Option<&PlotScale>, fy: Option<&PlotScale>, area: Rect) -> Self {
        let axis = |scale: Option<&PlotScale>, start: f64, extent: f64| match scale {
            Some(scale) if !scale.domain.is_empty() => {
                let positions = scale
                    .domain
                    .iter()
                    .map(|v| {
                        let p = scale.apply(v).to_f64();
                        if p.is_finite() {
                            p
                        } else {
                            start
                        }
                    })
                    .collect::<Vec<_>>();
                (scale.domain.clone(), positions, scale.bandwidth())
            }
            _ => (vec![RawValue::Null], vec![start], extent),
        };
        let (columns, xs, cell_width) = axis(fx, area.x, area.width);
        let (rows, ys, cell_height) = axis(fy, area.y, area.height);

        let mut cells = Vec::with_capacity(columns.len() * rows.len());
        for (row, y) in rows.iter().zip(&ys) {
            for (column, x) in columns.iter().zip(&xs) {
                cells.push(FacetCell {
                    fx: column.clone(),
                    fy: row.clone(),
                    frame: Rect {
                        x: *x,
                        y: *y,
                        width: cell_width,
                        height: cell_height,
                    },
                });
            }
        }
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
            cells,
        }
    }

    pub fn cells(&self) -> &[FacetCell] {
        &self.cells
    }

    pub fn is_faceted(&self) -> bool {
        self.cells.len() > 1 || self.cells.iter().any(|c| c.fx.is_defined() || c.fy.is_defined())
    }

    /// Options for scales laid out inside a single cell: the cell size
    /// replaces the plot size and margins drop to zero
    pub fn cell_options(&self, options: &PlotOptions) -> (PlotOptions, f64, f64) {
        let options = PlotOptions {
            margins: Margins {
                top: 0.0,
                right: 0.0,
                bottom: 0.0,
                left: 0.0,
            },
            ..options.clone()
        };
        (options, self.cell_width, self.cell_height)
    }
}

/// Whether no faceted user mark has a row in the `(fx, fy)` cell. Marks
/// without facet channels repeat in every cell and do not count.
pub fn facet_empty(marks: &[&Mark], fx: &RawValue, fy: &RawValue) -> Result<bool, AvengerPlotError> {
    let target = (GroupKey::from(fx), GroupKey::from(fy));
    let mut faceted = false;
    for mark in marks.iter().filter(|m| !m.is_automatic()) {
        let has_fx = mark.channels().contains_key(&Channel::Fx);
        let has_fy = mark.channels().contains_key(&Channel::Fy);
        if !has_fx && !has_fy {
            continue;
        }
        faceted = true;
        let mut keys = HashSet::new();
        for datum in mark.data() {
            let key = |channel: Channel, present: bool| -> Result<GroupKey, AvengerPlotError> {
                Ok(if present {
                    GroupKey::from(&resolve_channel(channel, datum, mark.channels())?)
                } else {
                    GroupKey::Null
                })
            };
            keys.insert((key(Channel::Fx, has_fx)?, key(Channel::Fy, has_fy)?));
        }
        let matches = keys.iter().any(|(kx, ky)| {
            (!has_fx || *kx == target.0) && (!has_fy || *ky == target.1)
        });
        if matches {
            return Ok(false);
        }
    }
    Ok(faceted)
}
