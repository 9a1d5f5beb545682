//! Aggregation of geospatial data onto pixel canvases.
//!
//! Vector features are rasterized with a per-pixel reduction, raster grids
//! are resampled (optionally from a zoom-appropriate overview), and the
//! resulting [`Aggregate`] can be post-processed by registered transforms
//! before shading.

pub mod aggregate;
pub mod geometry;
pub mod overview;
pub mod raster;
pub mod reduction;
pub mod transforms;

pub use aggregate::Aggregate;
pub use geometry::{aggregate_geometry, Feature};
pub use overview::{build_overviews, downsample_2x, OverviewSpec};
pub use raster::{aggregate_raster, select_raster, Interpolation, Overview, Raster};
pub use reduction::Reduction;
pub use transforms::{apply_transforms, prepare, TransformFn, TransformRegistry};
