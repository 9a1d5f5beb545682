//! Conversion of a numeric aggregate into colours.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use aggregation::Aggregate;
use map_common::{MapError, MapResult};

use crate::color::Color;
use crate::colormap::ColorMap;
use crate::image::RenderedImage;

/// Curve mapping a value within the span to a position along the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShadeHow {
    #[default]
    Linear,
    Log,
    Cbrt,
    EqHist,
}

impl ShadeHow {
    pub fn parse(s: &str) -> MapResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(ShadeHow::Linear),
            "log" => Ok(ShadeHow::Log),
            "cbrt" => Ok(ShadeHow::Cbrt),
            "eq_hist" => Ok(ShadeHow::EqHist),
            other => Err(MapError::invalid_config(
                "shade_how",
                format!("unknown shade function '{}'", other),
            )),
        }
    }
}

/// Value range policy for shading, as declared on a source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpanPolicy {
    /// Use the aggregate's own finite min and max.
    #[default]
    None,
    /// Use fixed bounds.
    Explicit(f64, f64),
    /// Use bounds computed over the whole source when it was loaded.
    MinMax,
}

/// Shade an aggregate.
///
/// `span` fixes the value range; `None` uses the aggregate's finite range.
/// Categorical colour maps ignore both `span` and `how`. No-data pixels are
/// transparent and an all-no-data aggregate yields a transparent image.
pub fn shade(
    agg: &Aggregate,
    colormap: &ColorMap,
    how: ShadeHow,
    span: Option<(f64, f64)>,
) -> MapResult<RenderedImage> {
    let colors: Vec<Color> = match colormap {
        ColorMap::Categorical(_) => agg
            .data()
            .par_iter()
            .map(|&v| colormap.category_color(v))
            .collect(),
        ColorMap::Ramp(_) => {
            let bounds = match span.or_else(|| agg.finite_range()) {
                Some(bounds) => bounds,
                None => return Ok(RenderedImage::transparent(agg.canvas())),
            };
            let normalizer = Normalizer::new(how, bounds, agg.data());
            agg.data()
                .par_iter()
                .map(|&v| match normalizer.position(v) {
                    Some(t) => colormap.ramp_color(t),
                    None => Color::transparent(),
                })
                .collect()
        }
    };

    let mut pixels = Vec::with_capacity(colors.len() * 4);
    for c in colors {
        pixels.extend_from_slice(&c.to_array());
    }
    RenderedImage::new(
        pixels,
        agg.width() as u32,
        agg.height() as u32,
        *agg.extent(),
    )
}

/// Maps values to ramp positions in [0, 1].
struct Normalizer {
    how: ShadeHow,
    lo: f64,
    hi: f64,
    /// Sorted distinct in-span values, for histogram equalisation.
    ranks: Vec<f64>,
}

impl Normalizer {
    fn new(how: ShadeHow, bounds: (f64, f64), data: &[f64]) -> Self {
        let (lo, hi) = if bounds.0 <= bounds.1 {
            bounds
        } else {
            (bounds.1, bounds.0)
        };

        let ranks = if how == ShadeHow::EqHist {
            let mut values: Vec<f64> = data
                .iter()
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(lo, hi))
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();
            values
        } else {
            Vec::new()
        };

        Self { how, lo, hi, ranks }
    }

    /// Ramp position for a value, None for no-data.
    fn position(&self, v: f64) -> Option<f64> {
        if !v.is_finite() {
            return None;
        }
        if self.hi == self.lo {
            return Some(0.5);
        }

        let v = v.clamp(self.lo, self.hi);
        let offset = v - self.lo;
        let range = self.hi - self.lo;

        let t = match self.how {
            ShadeHow::Linear => offset / range,
            ShadeHow::Log => offset.ln_1p() / range.ln_1p(),
            ShadeHow::Cbrt => offset.cbrt() / range.cbrt(),
            ShadeHow::EqHist => {
                if self.ranks.len() <= 1 {
                    0.5
                } else {
                    let rank = self.ranks.partition_point(|&r| r < v);
                    rank as f64 / (self.ranks.len() - 1) as f64
                }
            }
        };
        Some(t.clamp(0.0, 1.0))
    }
}
