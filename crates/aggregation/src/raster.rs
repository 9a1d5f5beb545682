//! Raster grids, overview selection and resampling onto a canvas.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use map_common::{CanvasSpec, Extent, MapError, MapResult, Padding};

use crate::aggregate::{finite_range, Aggregate};

/// A north-up raster grid. No-data cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    data: Vec<f64>,
    width: usize,
    height: usize,
    extent: Extent,
}

impl Raster {
    /// Build a raster. Data is row-major with row 0 at the top of `extent`.
    pub fn new(width: usize, height: usize, extent: Extent, data: Vec<f64>) -> MapResult<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::DataRead(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if data.len() != width * height {
            return Err(MapError::DataRead(format!(
                "raster has {} values, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        extent.validate()?;
        Ok(Self {
            data,
            width,
            height,
            extent,
        })
    }

    /// Replace `nodata` sentinel values with NaN.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        if let Some(nodata) = nodata {
            for v in self.data.iter_mut() {
                if *v == nodata {
                    *v = f64::NAN;
                }
            }
        }
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn cell_width(&self) -> f64 {
        self.extent.width() / self.width as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.extent.height() / self.height as f64
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// Finite min and max over the whole raster.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.data)
    }

    /// Number of cells whose centre lies inside `window`.
    pub fn cells_in_window(&self, window: &Extent) -> usize {
        let dx = self.cell_width();
        let dy = self.cell_height();
        let cols = (0..self.width)
            .filter(|&c| {
                let x = self.extent.min_x + (c as f64 + 0.5) * dx;
                x >= window.min_x && x <= window.max_x
            })
            .count();
        let rows = (0..self.height)
            .filter(|&r| {
                let y = self.extent.max_y - (r as f64 + 0.5) * dy;
                y >= window.min_y && y <= window.max_y
            })
            .count();
        cols * rows
    }
}

/// Resampling method used when a raster is drawn onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    Nearest,
}

impl Interpolation {
    pub fn parse(s: &str) -> MapResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "bilinear" => Ok(Interpolation::Linear),
            "nearest" => Ok(Interpolation::Nearest),
            other => Err(MapError::InvalidInterpolation(other.to_string())),
        }
    }
}

/// A reduced-resolution copy of a raster, served for zooms in
/// `[min_zoom, max_zoom)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub raster: Raster,
}

impl Overview {
    /// Default zoom band for the i-th overview: `[3i, 3i + 3)`.
    pub fn default_band(index: usize) -> (u32, u32) {
        let lo = 3 * index as u32;
        (lo, lo + 3)
    }

    pub fn serves(&self, zoom: u32) -> bool {
        zoom >= self.min_zoom && zoom < self.max_zoom
    }
}

/// Pick the raster to sample for a zoom level: the first overview whose band
/// contains it, otherwise the base raster.
pub fn select_raster<'a>(
    base: &'a Raster,
    overviews: &'a [Overview],
    zoom: Option<u32>,
) -> &'a Raster {
    zoom.and_then(|z| overviews.iter().find(|o| o.serves(z)))
        .map(|o| &o.raster)
        .unwrap_or(base)
}

/// Resample `raster` onto `canvas`, grown symmetrically by `padding`.
///
/// The returned aggregate covers the padded canvas. Pixels outside raster
/// coverage are NaN.
pub fn aggregate_raster(
    source_key: &str,
    raster: &Raster,
    canvas: &CanvasSpec,
    padding: f64,
    interpolation: Interpolation,
) -> MapResult<Aggregate> {
    let pad = Padding::from_fraction(canvas.width(), canvas.height(), padding);
    let working = canvas.padded(pad)?;

    let selected = raster.cells_in_window(working.extent());
    if selected == 0 {
        return Err(MapError::EmptyAggregate(source_key.to_string()));
    }

    debug!(
        source = %source_key,
        width = working.width(),
        height = working.height(),
        pad_left = pad.left,
        pad_top = pad.top,
        selected,
        "Resampling raster"
    );

    let xs = working.x_centers();
    let ys = working.y_centers();
    let width = working.width() as usize;
    let mut data = vec![f64::NAN; working.len()];

    data.par_chunks_mut(width)
        .zip(ys.par_iter())
        .for_each(|(row_out, &y)| {
            for (out, &x) in row_out.iter_mut().zip(&xs) {
                *out = sample(raster, x, y, interpolation);
            }
        });

    Aggregate::new(working, data)
}

/// Sample the raster at a world coordinate.
fn sample(raster: &Raster, x: f64, y: f64, interpolation: Interpolation) -> f64 {
    let extent = raster.extent();
    if !extent.contains_point(x, y) {
        return f64::NAN;
    }

    // Fractional position relative to cell centres.
    let fc = (x - extent.min_x) / raster.cell_width() - 0.5;
    let fr = (extent.max_y - y) / raster.cell_height() - 0.5;
    let max_c = raster.width() - 1;
    let max_r = raster.height() - 1;

    match interpolation {
        Interpolation::Nearest => {
            let c = (fc.round().max(0.0) as usize).min(max_c);
            let r = (fr.round().max(0.0) as usize).min(max_r);
            raster.get(c, r)
        }
        Interpolation::Linear => {
            let fc = fc.clamp(0.0, max_c as f64);
            let fr = fr.clamp(0.0, max_r as f64);
            let c0 = fc.floor() as usize;
            let r0 = fr.floor() as usize;
            let c1 = (c0 + 1).min(max_c);
            let r1 = (r0 + 1).min(max_r);
            let tx = fc - c0 as f64;
            let ty = fr - r0 as f64;

            let v00 = raster.get(c0, r0);
            let v10 = raster.get(c1, r0);
            let v01 = raster.get(c0, r1);
            let v11 = raster.get(c1, r1);
            if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
                return f64::NAN;
            }

            let top = v00 * (1.0 - tx) + v10 * tx;
            let bottom = v01 * (1.0 - tx) + v11 * tx;
            top * (1.0 - ty) + bottom * ty
        }
    }
}
