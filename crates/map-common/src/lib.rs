//! Common types shared by the aggregation, shading and service crates.

pub mod canvas;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod tile;

pub use canvas::{CanvasSpec, Padding, DEFAULT_TILE_SIZE, MAX_CANVAS_SIZE};
pub use error::{MapError, MapResult};
pub use extent::{Extent, ExtentRequest};
pub use geometry::GeometryKind;
pub use tile::{lonlat_to_mercator, TileCoord, MAX_ZOOM, WORLD_EXTENT, WORLD_HALF_SIZE};
