//! Common test fixtures for map shading tests.
//!
//! Extents, small GeoJSON documents and ESRI ASCII grids, plus helpers that
//! write them (and a matching source configuration) into a temp directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Common extents in web mercator meters, as `(xmin, ymin, xmax, ymax)`.
pub mod extent {
    /// Web mercator world square.
    pub const WORLD: (f64, f64, f64, f64) =
        (-20037508.34, -20037508.34, 20037508.34, 20037508.34);

    /// Default extent advertised for image and WMS services.
    pub const DEFAULT_SERVICE: (f64, f64, f64, f64) = (-20e6, -20e6, 20e6, 20e6);

    /// A 1000 km square around the origin.
    pub const ORIGIN_1000KM: (f64, f64, f64, f64) = (-500_000.0, -500_000.0, 500_000.0, 500_000.0);

    /// Invalid extent (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// GeoJSON FeatureCollection of points with a numeric `value` property.
pub fn points_geojson(points: &[(f64, f64, f64)]) -> Value {
    let features: Vec<Value> = points
        .iter()
        .map(|&(x, y, v)| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [x, y] },
                "properties": { "value": v }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// GeoJSON FeatureCollection of line strings with a numeric `value` property.
pub fn lines_geojson(lines: &[(Vec<[f64; 2]>, f64)]) -> Value {
    let features: Vec<Value> = lines
        .iter()
        .map(|(coords, v)| {
            json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": coords },
                "properties": { "value": v }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// GeoJSON FeatureCollection of polygons (exterior ring only) with a numeric
/// `value` property and a `name`.
pub fn polygons_geojson(polygons: &[(&str, Vec<[f64; 2]>, f64)]) -> Value {
    let features: Vec<Value> = polygons
        .iter()
        .map(|(name, ring, v)| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [ring] },
                "properties": { "name": name, "value": v }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// Render an ESRI ASCII grid. `data` is row-major, row 0 at the top.
pub fn esri_ascii_grid(
    width: usize,
    height: usize,
    xll: f64,
    yll: f64,
    cellsize: f64,
    nodata: f64,
    data: &[f64],
) -> String {
    let mut out = format!(
        "ncols {}\nnrows {}\nxllcorner {}\nyllcorner {}\ncellsize {}\nNODATA_value {}\n",
        width, height, xll, yll, cellsize, nodata
    );
    for row in data.chunks(width) {
        let line: Vec<String> = row
            .iter()
            .map(|v| if v.is_nan() { nodata.to_string() } else { v.to_string() })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// A temp directory holding fixture files. Removed on drop.
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a text file relative to the fixture directory.
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write a JSON document.
    pub fn write_json(&self, name: &str, value: &Value) -> io::Result<PathBuf> {
        self.write(name, &value.to_string())
    }
}

/// Source configuration covering every geometry kind, referencing the files
/// written by [`write_sample_sources`].
pub const SAMPLE_CONFIG_YAML: &str = r#"
sources:
  - key: elevation
    name: Elevation
    description: Synthetic hill
    geometry_type: raster
    filepath: data/elevation.asc
    cmap: [white, black]
    span: min/max
    shade_how: linear
    raster_interpolate: linear
    raster_padding: 0.05
    overviews:
      - levels: 1
        min_zoom: 0
        max_zoom: 3

  - key: cities
    name: Cities
    description: Scattered points
    geometry_type: point
    filepath: data/cities.geojson
    zfield: value
    agg_func: max
    cmap: viridis
    span: min/max
    dynspread: 2

  - key: roads
    name: Roads
    geometry_type: line
    filepath: data/roads.geojson
    agg_func: count
    cmap: ['#000000', '#ff0000']
    service_types: [tile, image]

  - key: parcels
    name: Parcels
    geometry_type: polygon
    filepath: data/parcels.geojson
    zfield: value
    agg_func: max
    cmap:
      1: red
      2: '#00ff00'
    service_types: [tile, wms, geojson]
"#;

/// Write the data files used by [`SAMPLE_CONFIG_YAML`] plus the config
/// itself (`sources.yaml`). Returns the config path.
///
/// All sources cover (roughly) the 1000 km square around the origin.
pub fn write_sample_sources(dir: &FixtureDir) -> io::Result<PathBuf> {
    let (w, h) = (32usize, 32usize);
    let grid = crate::generators::create_elevation_grid(w, h);
    let cellsize = 1_000_000.0 / w as f64;
    dir.write(
        "data/elevation.asc",
        &esri_ascii_grid(w, h, -500_000.0, -500_000.0, cellsize, -9999.0, &grid),
    )?;

    let points = crate::generators::create_point_cloud(200, extent::ORIGIN_1000KM, 42);
    dir.write_json("data/cities.geojson", &points_geojson(&points))?;

    dir.write_json(
        "data/roads.geojson",
        &lines_geojson(&[
            (vec![[-400_000.0, 0.0], [400_000.0, 0.0]], 1.0),
            (vec![[0.0, -400_000.0], [0.0, 400_000.0]], 2.0),
        ]),
    )?;

    dir.write_json(
        "data/parcels.geojson",
        &polygons_geojson(&[
            ("west", crate::generators::square_ring(-200_000.0, 0.0, 150_000.0), 1.0),
            ("east", crate::generators::square_ring(200_000.0, 0.0, 150_000.0), 2.0),
        ]),
    )?;

    dir.write("sources.yaml", SAMPLE_CONFIG_YAML)
}
