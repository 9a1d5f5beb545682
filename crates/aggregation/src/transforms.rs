//! Post-aggregation transforms.
//!
//! Every aggregate passes through [`prepare`] and then through the source's
//! extra transforms, looked up by name in a [`TransformRegistry`].

use std::collections::BTreeMap;

use tracing::debug;

use map_common::{MapError, MapResult};

use crate::aggregate::Aggregate;

/// A registered transform. Takes the aggregate by value and returns a new one.
pub type TransformFn = fn(Aggregate) -> MapResult<Aggregate>;

/// Immutable name -> transform table.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, TransformFn>,
}

impl TransformRegistry {
    /// A registry with no transforms.
    pub fn empty() -> Self {
        Self {
            transforms: BTreeMap::new(),
        }
    }

    /// The built-in transforms: `hillshade` and `quantile`.
    pub fn builtin() -> Self {
        Self::empty()
            .with("hillshade", hillshade)
            .with("quantile", quantile)
    }

    pub fn with(mut self, name: impl Into<String>, transform: TransformFn) -> Self {
        self.transforms.insert(name.into(), transform);
        self
    }

    pub fn get(&self, name: &str) -> Option<TransformFn> {
        self.transforms.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.transforms.keys()).finish()
    }
}

/// Exact zeros become no-data.
pub fn prepare(agg: Aggregate) -> Aggregate {
    agg.map(|v| if v == 0.0 { f64::NAN } else { v })
}

/// Run [`prepare`] and then each named transform in order.
///
/// All names are resolved before anything runs; the first unknown name is
/// reported as [`MapError::UnknownTransform`].
pub fn apply_transforms(
    agg: Aggregate,
    names: &[String],
    registry: &TransformRegistry,
) -> MapResult<Aggregate> {
    let transforms = names
        .iter()
        .map(|name| {
            registry
                .get(name)
                .ok_or_else(|| MapError::UnknownTransform(name.clone()))
        })
        .collect::<MapResult<Vec<_>>>()?;

    let mut agg = prepare(agg);
    for (name, transform) in names.iter().zip(transforms) {
        debug!(transform = %name, "Applying transform");
        agg = transform(agg)?;
    }
    Ok(agg)
}

const HILLSHADE_AZIMUTH: f64 = 225.0;
const HILLSHADE_ALTITUDE: f64 = 25.0;

/// Illumination of the surface from azimuth 225 and altitude 25 degrees,
/// scaled to [0, 1]. Border cells and cells next to no-data are no-data.
pub fn hillshade(agg: Aggregate) -> MapResult<Aggregate> {
    let width = agg.width();
    let height = agg.height();
    let data = agg.data();
    let mut out = vec![f64::NAN; data.len()];

    let azimuth = HILLSHADE_AZIMUTH.to_radians();
    let altitude = HILLSHADE_ALTITUDE.to_radians();

    for row in 1..height.saturating_sub(1) {
        for col in 1..width.saturating_sub(1) {
            let at = |c: usize, r: usize| data[r * width + c];
            // Central differences along rows and columns.
            let d_row = (at(col, row + 1) - at(col, row - 1)) / 2.0;
            let d_col = (at(col + 1, row) - at(col - 1, row)) / 2.0;
            if d_row.is_nan() || d_col.is_nan() || at(col, row).is_nan() {
                continue;
            }

            let slope = std::f64::consts::FRAC_PI_2 - (d_row * d_row + d_col * d_col).sqrt().atan();
            let aspect = (-d_row).atan2(d_col);
            let facing = (azimuth - std::f64::consts::FRAC_PI_2) - aspect;
            let shaded =
                altitude.sin() * slope.sin() + altitude.cos() * slope.cos() * facing.cos();

            out[row * width + col] = (shaded + 1.0) / 2.0;
        }
    }

    agg.with_data(out)
}

const QUANTILE_CLASSES: usize = 4;

/// Classify values into 4 quantile classes (0..=3). No-data stays no-data.
pub fn quantile(agg: Aggregate) -> MapResult<Aggregate> {
    let mut finite: Vec<f64> = agg.data().iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Ok(agg);
    }
    finite.sort_by(|a, b| a.total_cmp(b));

    let step = 100.0 / QUANTILE_CLASSES as f64;
    let mut bins: Vec<f64> = (1..QUANTILE_CLASSES)
        .map(|i| percentile(&finite, step * i as f64))
        .collect();
    bins.push(finite[finite.len() - 1]);

    Ok(agg.map(|v| {
        if !v.is_finite() {
            return f64::NAN;
        }
        let class = bins.iter().position(|&b| v <= b).unwrap_or(QUANTILE_CLASSES - 1);
        class as f64
    }))
}

/// Percentile of sorted values with linear interpolation between ranks.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let pos = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
