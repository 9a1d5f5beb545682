//! Reading source data from disk.
//!
//! Vector sources are GeoJSON FeatureCollections. Raster sources are ESRI
//! ASCII grids (`.asc`, georeferenced by their header) or single-band
//! images (`.png`, `.tif`, ...) placed on the extent given in the config.
//! Everything is brought into web mercator before rendering.

use std::fs;
use std::path::Path;

use geo::{Coord, MapCoords};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use aggregation::{build_overviews, Feature, Raster};
use map_common::{lonlat_to_mercator, Extent, GeometryKind, MapError, MapResult};

use crate::geojson::GeoJsonFeatureCollection;
use crate::source::{LoadedSource, SourceData, SourceDescriptor, WEB_MERCATOR_EPSG, WGS84_EPSG};

/// Load a source's data, build its overviews and compute its value range.
#[instrument(skip(descriptor), fields(source = %descriptor.key, kind = %descriptor.geometry_kind))]
pub fn load_source(descriptor: SourceDescriptor) -> MapResult<LoadedSource> {
    let (data, value_range) = match descriptor.geometry_kind {
        GeometryKind::Raster => {
            if descriptor.epsg != WEB_MERCATOR_EPSG {
                return Err(MapError::InvalidProjection(descriptor.epsg));
            }
            let base = read_raster(&descriptor)?;
            let overviews = build_overviews(&descriptor.key, &base, &descriptor.overviews)?;
            let range = base.finite_range();
            (SourceData::Raster { base, overviews }, range)
        }
        kind => {
            let features = read_geojson(&descriptor.filepath, kind)?;
            let features = match descriptor.epsg {
                WEB_MERCATOR_EPSG => features,
                WGS84_EPSG => to_web_mercator(features),
                other => return Err(MapError::InvalidProjection(other)),
            };
            let range = descriptor
                .value_field
                .as_deref()
                .and_then(|field| field_range(&features, field));
            (SourceData::Vector(features), range)
        }
    };

    info!(value_range = ?value_range, "Loaded source");
    Ok(LoadedSource {
        descriptor,
        data,
        value_range,
    })
}

/// Read a GeoJSON FeatureCollection whose geometries are all of `kind`.
///
/// Null geometries are skipped.
pub fn read_geojson(path: &Path, kind: GeometryKind) -> MapResult<Vec<Feature>> {
    let text = fs::read_to_string(path)
        .map_err(|e| MapError::DataRead(format!("{}: {}", path.display(), e)))?;
    let collection: GeoJsonFeatureCollection = serde_json::from_str(&text)?;

    let mut features = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;
    for (i, raw) in collection.features.iter().enumerate() {
        let Some(feature) = raw.to_feature() else {
            skipped += 1;
            continue;
        };
        if !feature.matches_kind(kind) {
            return Err(MapError::DataRead(format!(
                "{}: feature {} is not a {} geometry",
                path.display(),
                i,
                kind
            )));
        }
        features.push(feature);
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Skipped features without geometry");
    }
    Ok(features)
}

/// Project lon/lat features to web mercator.
fn to_web_mercator(features: Vec<Feature>) -> Vec<Feature> {
    features
        .into_iter()
        .map(|f| Feature {
            geometry: f.geometry.map_coords(|c| {
                let (x, y) = lonlat_to_mercator(c.x, c.y);
                Coord { x, y }
            }),
            properties: f.properties,
        })
        .collect()
}

/// Finite min/max of a numeric attribute over all features.
fn field_range(features: &[Feature], field: &str) -> Option<(f64, f64)> {
    features
        .iter()
        .filter_map(|f| f.numeric_property(field))
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn read_raster(descriptor: &SourceDescriptor) -> MapResult<Raster> {
    let path = &descriptor.filepath;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "asc" => read_ascii_grid(path),
        "png" | "tif" | "tiff" | "jpg" | "jpeg" => {
            let extent = descriptor.raster_extent.ok_or_else(|| {
                MapError::invalid_config(
                    "extent",
                    format!("image raster '{}' needs an extent", descriptor.key),
                )
            })?;
            read_image_raster(path, extent)
        }
        other => Err(MapError::DataRead(format!(
            "{}: unsupported raster format '{}'",
            path.display(),
            other
        ))),
    }
}

/// Read an ESRI ASCII grid.
///
/// Header keys are case-insensitive; `xllcenter`/`yllcenter` are accepted in
/// place of the corner keys. `NODATA_value` cells become NaN.
pub fn read_ascii_grid(path: &Path) -> MapResult<Raster> {
    let text = fs::read_to_string(path)
        .map_err(|e| MapError::DataRead(format!("{}: {}", path.display(), e)))?;
    parse_ascii_grid(&text).map_err(|e| match e {
        MapError::DataRead(msg) => MapError::DataRead(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

fn parse_ascii_grid(text: &str) -> MapResult<Raster> {
    let mut tokens = text.split_whitespace().peekable();

    let mut ncols: Option<usize> = None;
    let mut nrows: Option<usize> = None;
    let mut xll: Option<(f64, bool)> = None;
    let mut yll: Option<(f64, bool)> = None;
    let mut cellsize: Option<f64> = None;
    let mut nodata: Option<f64> = None;

    while let Some(&token) = tokens.peek() {
        if token.parse::<f64>().is_ok() {
            break;
        }
        let key = token.to_lowercase();
        tokens.next();
        let value = tokens
            .next()
            .ok_or_else(|| MapError::DataRead(format!("missing value for header '{}'", key)))?;
        let number = |v: &str| -> MapResult<f64> {
            v.parse()
                .map_err(|_| MapError::DataRead(format!("invalid value '{}' for '{}'", v, key)))
        };

        match key.as_str() {
            "ncols" => ncols = Some(number(value)? as usize),
            "nrows" => nrows = Some(number(value)? as usize),
            "xllcorner" => xll = Some((number(value)?, false)),
            "xllcenter" => xll = Some((number(value)?, true)),
            "yllcorner" => yll = Some((number(value)?, false)),
            "yllcenter" => yll = Some((number(value)?, true)),
            "cellsize" => cellsize = Some(number(value)?),
            "nodata_value" => nodata = Some(number(value)?),
            other => {
                return Err(MapError::DataRead(format!("unknown header '{}'", other)));
            }
        }
    }

    let missing = |name: &str| MapError::DataRead(format!("missing header '{}'", name));
    let ncols = ncols.ok_or_else(|| missing("ncols"))?;
    let nrows = nrows.ok_or_else(|| missing("nrows"))?;
    let cellsize = cellsize.ok_or_else(|| missing("cellsize"))?;
    let (x0, x_center) = xll.ok_or_else(|| missing("xllcorner"))?;
    let (y0, y_center) = yll.ok_or_else(|| missing("yllcorner"))?;

    let min_x = if x_center { x0 - cellsize / 2.0 } else { x0 };
    let min_y = if y_center { y0 - cellsize / 2.0 } else { y0 };
    let extent = Extent::checked(
        min_x,
        min_y,
        min_x + ncols as f64 * cellsize,
        min_y + nrows as f64 * cellsize,
    )?;

    let data = tokens
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| MapError::DataRead(format!("invalid cell value '{}'", t)))
        })
        .collect::<MapResult<Vec<f64>>>()?;

    Ok(Raster::new(ncols, nrows, extent, data)?.with_nodata(nodata))
}

/// Read the first band of an image file as a raster on `extent`.
pub fn read_image_raster(path: &Path, extent: Extent) -> MapResult<Raster> {
    let img = image::open(path)
        .map_err(|e| MapError::DataRead(format!("{}: {}", path.display(), e)))?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let data: Vec<f64> = match img {
        DynamicImage::ImageLuma16(buf) => buf.pixels().map(|p| p.0[0] as f64).collect(),
        DynamicImage::ImageRgb32F(buf) => buf.pixels().map(|p| p.0[0] as f64).collect(),
        DynamicImage::ImageRgba32F(buf) => buf.pixels().map(|p| p.0[0] as f64).collect(),
        other => other.to_luma8().pixels().map(|p| p.0[0] as f64).collect(),
    };

    Raster::new(width, height, extent, data)
}
