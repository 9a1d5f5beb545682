//! Continuous colour ramps and categorical colour keys.

use map_common::{MapError, MapResult};

use crate::color::Color;

/// Colour assignment for shading.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorMap {
    /// Evenly spaced colours interpolated over [0, 1].
    Ramp(Vec<Color>),
    /// Exact value -> colour. Values without a key are transparent.
    Categorical(Vec<(f64, Color)>),
}

/// Name of the ramp used when a source configures none.
pub const DEFAULT_RAMP: &str = "viridis";

const VIRIDIS: [(u8, u8, u8); 10] = [
    (68, 1, 84),
    (72, 40, 120),
    (62, 74, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (109, 205, 89),
    (180, 222, 44),
    (253, 231, 37),
];

const FIRE: [(u8, u8, u8); 6] = [
    (0, 0, 0),
    (120, 0, 0),
    (220, 30, 0),
    (255, 120, 0),
    (255, 210, 40),
    (255, 255, 255),
];

const GREYS: [(u8, u8, u8); 2] = [(255, 255, 255), (0, 0, 0)];

const BLUES: [(u8, u8, u8); 5] = [
    (247, 251, 255),
    (198, 219, 239),
    (107, 174, 214),
    (33, 113, 181),
    (8, 48, 107),
];

impl ColorMap {
    /// A built-in ramp by name.
    pub fn named(name: &str) -> MapResult<Self> {
        let stops: &[(u8, u8, u8)] = match name.trim().to_lowercase().as_str() {
            "viridis" => &VIRIDIS,
            "fire" => &FIRE,
            "greys" | "grays" => &GREYS,
            "blues" => &BLUES,
            other => {
                return Err(MapError::invalid_config(
                    "cmap",
                    format!("unknown colour ramp '{}'", other),
                ))
            }
        };
        Ok(ColorMap::Ramp(
            stops.iter().map(|&(r, g, b)| Color::rgb(r, g, b)).collect(),
        ))
    }

    /// A ramp from colour strings.
    pub fn ramp<S: AsRef<str>>(colors: &[S]) -> MapResult<Self> {
        if colors.is_empty() {
            return Err(MapError::invalid_config("cmap", "colour list is empty"));
        }
        let colors = colors
            .iter()
            .map(|c| Color::parse(c.as_ref()))
            .collect::<MapResult<Vec<_>>>()?;
        Ok(ColorMap::Ramp(colors))
    }

    /// A categorical colour key from `(value, colour string)` pairs.
    pub fn categorical<S: AsRef<str>>(entries: &[(f64, S)]) -> MapResult<Self> {
        let entries = entries
            .iter()
            .map(|(value, color)| Ok((*value, Color::parse(color.as_ref())?)))
            .collect::<MapResult<Vec<_>>>()?;
        Ok(ColorMap::Categorical(entries))
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColorMap::Categorical(_))
    }

    /// Colour at position `t` along a ramp. Categorical maps return
    /// transparent.
    pub fn ramp_color(&self, t: f64) -> Color {
        let colors = match self {
            ColorMap::Ramp(colors) => colors,
            ColorMap::Categorical(_) => return Color::transparent(),
        };
        match colors.len() {
            0 => Color::transparent(),
            1 => colors[0],
            n => {
                let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
                let lo = (pos.floor() as usize).min(n - 2);
                colors[lo].lerp(colors[lo + 1], pos - lo as f64)
            }
        }
    }

    /// Colour for a categorical value.
    pub fn category_color(&self, value: f64) -> Color {
        match self {
            ColorMap::Categorical(entries) => entries
                .iter()
                .find(|(key, _)| *key == value)
                .map(|(_, color)| *color)
                .unwrap_or_else(Color::transparent),
            ColorMap::Ramp(_) => Color::transparent(),
        }
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        ColorMap::Ramp(VIRIDIS.iter().map(|&(r, g, b)| Color::rgb(r, g, b)).collect())
    }
}
