//! Overview (pyramid level) generation by 2x downsampling.

use serde::{Deserialize, Serialize};
use tracing::info;

use map_common::{Extent, MapResult};

use crate::raster::{Overview, Raster};

/// Requested overview: how many times to halve the base raster and which
/// zoom band it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewSpec {
    pub levels: u32,
    pub min_zoom: u32,
    pub max_zoom: u32,
}

/// Downsample a 2D grid by a factor of 2.
///
/// Takes a grid of size (width, height) and produces a grid of size
/// (width/2, height/2), rounded down for odd dimensions. Each output cell is
/// the mean of the valid (non-NaN) cells of its 2x2 block.
pub fn downsample_2x(data: &[f64], width: usize, height: usize) -> (Vec<f64>, usize, usize) {
    let new_width = width / 2;
    let new_height = height / 2;

    if new_width == 0 || new_height == 0 {
        return (vec![], 0, 0);
    }

    let mut output = vec![f64::NAN; new_width * new_height];

    for out_y in 0..new_height {
        for out_x in 0..new_width {
            let in_x = out_x * 2;
            let in_y = out_y * 2;

            let v00 = data.get(in_y * width + in_x).copied().unwrap_or(f64::NAN);
            let v10 = data.get(in_y * width + in_x + 1).copied().unwrap_or(f64::NAN);
            let v01 = data.get((in_y + 1) * width + in_x).copied().unwrap_or(f64::NAN);
            let v11 = data.get((in_y + 1) * width + in_x + 1).copied().unwrap_or(f64::NAN);

            output[out_y * new_width + out_x] = mean_of_block(v00, v10, v01, v11);
        }
    }

    (output, new_width, new_height)
}

/// Mean of a 2x2 block ignoring NaN; NaN if every value is NaN.
#[inline]
fn mean_of_block(v00: f64, v10: f64, v01: f64, v11: f64) -> f64 {
    let mut sum = 0.0;
    let mut count = 0;

    for v in [v00, v10, v01, v11] {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Halve a raster once. Returns None when it is too small to halve.
///
/// For odd dimensions the trailing row/column is dropped and the extent
/// shrinks to the area still covered.
fn halve(raster: &Raster) -> MapResult<Option<Raster>> {
    let (data, w, h) = downsample_2x(raster.data(), raster.width(), raster.height());
    if w == 0 || h == 0 {
        return Ok(None);
    }

    let src = raster.extent();
    let extent = Extent::new(
        src.min_x,
        src.max_y - (h * 2) as f64 * raster.cell_height(),
        src.min_x + (w * 2) as f64 * raster.cell_width(),
        src.max_y,
    );
    Raster::new(w, h, extent, data).map(Some)
}

/// Build overviews for a base raster, one per requested overview, in order.
pub fn build_overviews(
    source_key: &str,
    base: &Raster,
    specs: &[OverviewSpec],
) -> MapResult<Vec<Overview>> {
    let mut overviews = Vec::with_capacity(specs.len());

    for spec in specs {
        let mut raster = base.clone();
        for _ in 0..spec.levels {
            match halve(&raster)? {
                Some(smaller) => raster = smaller,
                None => break,
            }
        }

        info!(
            source = %source_key,
            levels = spec.levels,
            min_zoom = spec.min_zoom,
            max_zoom = spec.max_zoom,
            width = raster.width(),
            height = raster.height(),
            "Built overview"
        );

        overviews.push(Overview {
            min_zoom: spec.min_zoom,
            max_zoom: spec.max_zoom,
            raster,
        });
    }

    Ok(overviews)
}
