//! Planar and geographic projections fitted to a frame

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use geo::MapCoords;
use geo_types::{Coord, Geometry, LineString, Polygon};
use strum::{Display, EnumString, VariantNames};

use crate::layout::Rect;

/// Receives projected coordinates, in the manner of a d3 geo stream
pub trait GeoStream {
    fn point(&mut self, x: f64, y: f64);
    fn line_start(&mut self) {}
    fn line_end(&mut self) {}
    fn polygon_start(&mut self) {}
    fn polygon_end(&mut self) {}
}

/// A projection from data coordinates (longitude/latitude in degrees for
/// geographic projections) onto pixels. External providers implement this
/// trait to plug in other projections.
pub trait GeoProjection: Send + Sync {
    /// `None` when the point cannot be projected
    fn project(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Height over width of the projected sphere, for projections with a
    /// natural extent
    fn aspect_ratio(&self) -> Option<f64>;

    /// Feed every projected coordinate of `geometry` to `sink`
    fn stream(&self, geometry: &Geometry<f64>, sink: &mut dyn GeoStream) {
        let point = |c: &Coord<f64>, sink: &mut dyn GeoStream| {
            if let Some((x, y)) = self.project(c.x, c.y) {
                sink.point(x, y);
            }
        };
        let line = |ls: &LineString<f64>, sink: &mut dyn GeoStream| {
            sink.line_start();
            for c in ls.coords() {
                point(c, &mut *sink);
            }
            sink.line_end();
        };
        let polygon = |p: &Polygon<f64>, sink: &mut dyn GeoStream| {
            sink.polygon_start();
            line(p.exterior(), &mut *sink);
            for ring in p.interiors() {
                line(ring, &mut *sink);
            }
            sink.polygon_end();
        };
        match geometry {
            Geometry::Point(p) => point(&p.0, sink),
            Geometry::MultiPoint(mp) => {
                for p in mp.iter() {
                    point(&p.0, &mut *sink);
                }
            }
            Geometry::Line(l) => line(&LineString::from(vec![l.start, l.end]), sink),
            Geometry::LineString(ls) => line(ls, sink),
            Geometry::MultiLineString(mls) => {
                for ls in mls.iter() {
                    line(ls, &mut *sink);
                }
            }
            Geometry::Polygon(p) => polygon(p, sink),
            Geometry::MultiPolygon(mp) => {
                for p in mp.iter() {
                    polygon(p, &mut *sink);
                }
            }
            Geometry::Rect(r) => polygon(&r.to_polygon(), sink),
            Geometry::Triangle(t) => polygon(&t.to_polygon(), sink),
            Geometry::GeometryCollection(gc) => {
                for g in gc.iter() {
                    self.stream(g, &mut *sink);
                }
            }
        }
    }
}

/// Mercator is clipped at the latitude where it becomes square
const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum ProjectionType {
    Identity,
    ReflectY,
    Equirectangular,
    Mercator,
}

impl ProjectionType {
    pub fn is_geographic(&self) -> bool {
        matches!(self, ProjectionType::Equirectangular | ProjectionType::Mercator)
    }

    /// Unscaled projection of a point
    fn raw(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        match self {
            ProjectionType::Identity => Some((x, y)),
            ProjectionType::ReflectY => Some((x, -y)),
            ProjectionType::Equirectangular => Some((x.to_radians(), -y.to_radians())),
            ProjectionType::Mercator => {
                let phi = y
                    .clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE)
                    .to_radians();
                Some((x.to_radians(), -(FRAC_PI_4 + phi / 2.0).tan().ln()))
            }
        }
    }

    /// Raw bounds of the whole sphere
    fn sphere(&self) -> Option<[f64; 4]> {
        match self {
            ProjectionType::Equirectangular => Some([-PI, -FRAC_PI_2, PI, FRAC_PI_2]),
            ProjectionType::Mercator => Some([-PI, -PI, PI, PI]),
            _ => None,
        }
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.sphere()
            .map(|[x0, y0, x1, y1]| (y1 - y0) / (x1 - x0))
    }
}

/// Collects the bounding box of streamed points
#[derive(Debug, Default)]
struct Bounds(Option<[f64; 4]>);

impl GeoStream for Bounds {
    fn point(&mut self, x: f64, y: f64) {
        self.0 = Some(match self.0 {
            Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
            None => [x, y, x, y],
        });
    }
}

/// Unscaled projection used to measure geometry before fitting
struct Unscaled(ProjectionType);

impl GeoProjection for Unscaled {
    fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.0.raw(x, y)
    }

    fn aspect_ratio(&self) -> Option<f64> {
        self.0.aspect_ratio()
    }
}

/// A built-in projection scaled and translated into a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedProjection {
    kind: ProjectionType,
    scale: f64,
    translate: (f64, f64),
}

impl NamedProjection {
    /// Fit `kind` into `frame`. The extent fitted is that of `geometry` when
    /// given, the sphere for geographic projections, and otherwise planar
    /// coordinates are used as pixels offset by the frame origin.
    pub fn fit(kind: ProjectionType, frame: Rect, geometry: Option<&Geometry<f64>>) -> Self {
        let bounds = match geometry {
            Some(geometry) => {
                let mut bounds = Bounds::default();
                Unscaled(kind).stream(geometry, &mut bounds);
                bounds.0
            }
            None => kind.sphere(),
        };

        match bounds {
            Some([x0, y0, x1, y1]) => {
                let (dx, dy) = (x1 - x0, y1 - y0);
                let k = match (dx > 0.0, dy > 0.0) {
                    (true, true) => (frame.width / dx).min(frame.height / dy),
                    (true, false) => frame.width / dx,
                    (false, true) => frame.height / dy,
                    (false, false) => 1.0,
                };
                Self {
                    kind,
                    scale: k,
                    translate: (
                        frame.x + (frame.width - k * (x0 + x1)) / 2.0,
                        frame.y + (frame.height - k * (y0 + y1)) / 2.0,
                    ),
                }
            }
            None => {
                let ty = match kind {
                    ProjectionType::ReflectY => frame.y + frame.height,
                    _ => frame.y,
                };
                Self {
                    kind,
                    scale: 1.0,
                    translate: (frame.x, ty),
                }
            }
        }
    }

    pub fn kind(&self) -> ProjectionType {
        self.kind
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> (f64, f64) {
        self.translate
    }
}

impl GeoProjection for NamedProjection {
    fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (x, y) = self.kind.raw(x, y)?;
        Some((
            self.scale * x + self.translate.0,
            self.scale * y + self.translate.1,
        ))
    }

    fn aspect_ratio(&self) -> Option<f64> {
        self.kind.aspect_ratio()
    }
}

/// Geometry with every coordinate projected. Unprojectable coordinates
/// become NaN.
pub fn project_geometry(projection: &dyn GeoProjection, geometry: &Geometry<f64>) -> Geometry<f64> {
    geometry.map_coords(|c| match projection.project(c.x, c.y) {
        Some((x, y)) => Coord { x, y },
        None => Coord {
            x: f64::NAN,
            y: f64::NAN,
        },
    })
}
