//! Map shading service library.
//!
//! Loads sources declared in a YAML config and serves them as XYZ tiles,
//! bounding-box images, WMS-style images and GeoJSON.

pub mod config;
pub mod geojson;
pub mod handlers;
pub mod loaders;
pub mod metrics;
pub mod rendering;
pub mod source;
pub mod state;
