//! Aggregation of point, line and polygon features onto a canvas.
//!
//! Points are binned directly. Lines and polygons are burned with
//! `geo-rasterize`, which follows GDAL's all-touched rules.

use geo::{BoundingRect, Coord, CoordsIter, Geometry, MapCoords};
use geo_rasterize::BinaryBuilder;
use serde_json::{Map, Value};
use tracing::debug;

use map_common::{CanvasSpec, GeometryKind, MapError, MapResult};

use crate::aggregate::Aggregate;
use crate::reduction::{Accumulator, Reduction};

/// A vector feature: geometry in projected coordinates plus its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Numeric value of an attribute. Missing and non-numeric values are None.
    pub fn numeric_property(&self, field: &str) -> Option<f64> {
        match self.properties.get(field)? {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Whether the geometry is of the given kind.
    pub fn matches_kind(&self, kind: GeometryKind) -> bool {
        geometry_matches(&self.geometry, kind)
    }
}

fn geometry_matches(geometry: &Geometry<f64>, kind: GeometryKind) -> bool {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => kind == GeometryKind::Point,
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            kind == GeometryKind::Line
        }
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => kind == GeometryKind::Polygon,
        Geometry::GeometryCollection(gc) => gc.0.iter().all(|g| geometry_matches(g, kind)),
    }
}

/// Reduce features onto the canvas.
///
/// Without a value field every feature contributes 1 to an unweighted count.
/// With a value field, features whose value is missing or non-numeric are
/// skipped and the reduction is applied per pixel. Features whose geometry
/// does not match `kind` are ignored.
pub fn aggregate_geometry(
    source_key: &str,
    kind: GeometryKind,
    features: &[Feature],
    canvas: &CanvasSpec,
    value_field: Option<&str>,
    reduction: Reduction,
) -> MapResult<Aggregate> {
    if kind == GeometryKind::Raster {
        return Err(MapError::UnsupportedGeometry {
            source_key: source_key.to_string(),
            kind: kind.to_string(),
        });
    }

    let reduction = if value_field.is_some() {
        reduction
    } else {
        Reduction::Count
    };

    let mut acc = Accumulator::new(reduction, canvas.len());
    let mut skipped = 0usize;

    for feature in features {
        let value = match value_field {
            Some(field) => match feature.numeric_property(field) {
                Some(v) => v,
                None => {
                    skipped += 1;
                    continue;
                }
            },
            None => 1.0,
        };

        if !feature.matches_kind(kind) {
            skipped += 1;
            continue;
        }

        match kind {
            GeometryKind::Point => bin_points(&feature.geometry, canvas, &mut acc, value),
            _ => {
                if !burn_feature(&feature.geometry, canvas, &mut acc, value)? {
                    skipped += 1;
                }
            }
        }
    }

    if skipped > 0 {
        debug!(source = %source_key, skipped, "Skipped features during aggregation");
    }

    Aggregate::new(*canvas, acc.finish())
}

/// Points are binned into the pixel whose cell contains them; every point
/// counts, including repeated points of a multipoint.
fn bin_points(geometry: &Geometry<f64>, canvas: &CanvasSpec, acc: &mut Accumulator, value: f64) {
    let width = canvas.width() as usize;
    for c in geometry.coords_iter() {
        if let Some((col, row)) = canvas.pixel_of(c.x, c.y) {
            acc.add(row * width + col, value);
        }
    }
}

/// Burn a line or polygon feature into the accumulator, touching each pixel
/// at most once. Returns false when the geometry has non-finite coordinates.
///
/// The feature is rasterized into a mask covering only its pixel bounding
/// box, clipped to the canvas.
fn burn_feature(
    geometry: &Geometry<f64>,
    canvas: &CanvasSpec,
    acc: &mut Accumulator,
    value: f64,
) -> MapResult<bool> {
    let Some(bounds) = geometry.bounding_rect() else {
        return Ok(true);
    };
    let (left, top) = canvas.world_to_pixel(bounds.min().x, bounds.max().y);
    let (right, bottom) = canvas.world_to_pixel(bounds.max().x, bounds.min().y);
    if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
        return Ok(false);
    }

    let Some((col0, col1)) = pixel_span(left, right, canvas.width()) else {
        return Ok(true);
    };
    let Some((row0, row1)) = pixel_span(top, bottom, canvas.height()) else {
        return Ok(true);
    };

    let (dx, dy) = (col0 as f64, row0 as f64);
    let local = geometry.map_coords(|c| {
        let (col, row) = canvas.world_to_pixel(c.x, c.y);
        Coord {
            x: col - dx,
            y: row - dy,
        }
    });

    let mut mask = BinaryBuilder::new()
        .width(col1 - col0)
        .height(row1 - row0)
        .build()
        .map_err(|e| MapError::InvalidRequest(format!("rasterizer setup failed: {}", e)))?;
    if mask.rasterize(&local).is_err() {
        return Ok(false);
    }

    let width = canvas.width() as usize;
    for ((row, col), &hit) in mask.finish().indexed_iter() {
        if hit {
            acc.add((row0 + row) * width + col0 + col, value);
        }
    }
    Ok(true)
}

/// Whole-pixel range `[lo, hi)` covering `[a, b]`, clipped to `[0, dim)`.
fn pixel_span(a: f64, b: f64, dim: u32) -> Option<(usize, usize)> {
    let lo = a.min(b).floor().max(0.0);
    let hi = (a.max(b).floor() + 1.0).min(dim as f64);
    if hi <= lo {
        return None;
    }
    Some((lo as usize, hi as usize))
}
