//! Shading of aggregates into RGBA images.
//!
//! - Colour parsing and colour maps (ramps and categorical keys)
//! - Shading with linear, log, cube-root and histogram-equalised curves
//! - Spreading of sparse pixels
//! - PNG encoding

pub mod color;
pub mod colormap;
pub mod image;
pub mod png;
pub mod shade;
pub mod spread;

pub use color::Color;
pub use colormap::{ColorMap, DEFAULT_RAMP};
pub use crate::image::RenderedImage;
pub use shade::{shade, ShadeHow, SpanPolicy};
pub use spread::{density, dynspread, spread, DYNSPREAD_THRESHOLD, MAX_SPREAD_PX};
