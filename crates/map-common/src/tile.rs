//! Web mercator tile addressing.
//!
//! Tiles follow the XYZ convention used by web mapping clients: the world
//! square is split into 2^z columns and rows, column 0 at the western edge and
//! row 0 at the northern edge.

use serde::{Deserialize, Serialize};

use crate::{Extent, MapError, MapResult};

/// Half the side of the web mercator world square, in meters.
pub const WORLD_HALF_SIZE: f64 = 20037508.34;

/// The full web mercator world square.
pub const WORLD_EXTENT: Extent = Extent {
    min_x: -WORLD_HALF_SIZE,
    min_y: -WORLD_HALF_SIZE,
    max_x: WORLD_HALF_SIZE,
    max_y: WORLD_HALF_SIZE,
};

/// Deepest zoom level accepted for tile requests.
pub const MAX_ZOOM: u32 = 30;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the top
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along each axis at this zoom level.
    pub fn tiles_per_axis(z: u32) -> u64 {
        1u64 << z
    }

    /// Get the parent tile (zoom - 1).
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Get the four children tiles (zoom + 1).
    pub fn children(&self) -> [TileCoord; 4] {
        let x = self.x * 2;
        let y = self.y * 2;
        let z = self.z + 1;
        [
            TileCoord { z, x, y },
            TileCoord { z, x: x + 1, y },
            TileCoord { z, x, y: y + 1 },
            TileCoord {
                z,
                x: x + 1,
                y: y + 1,
            },
        ]
    }

    /// Projected extent covered by this tile.
    pub fn extent(&self) -> MapResult<Extent> {
        if self.z > MAX_ZOOM {
            return Err(MapError::InvalidRequest(format!(
                "zoom level {} is out of range (0-{})",
                self.z, MAX_ZOOM
            )));
        }

        let n = Self::tiles_per_axis(self.z);
        if self.x as u64 >= n || self.y as u64 >= n {
            return Err(MapError::InvalidRequest(format!(
                "tile {}/{}/{} is outside the tile grid (0-{})",
                self.z,
                self.x,
                self.y,
                n - 1
            )));
        }

        let tile_size = 2.0 * WORLD_HALF_SIZE / n as f64;
        // Shared boundaries are computed with the same expression from both
        // neighbours so adjacent tiles meet exactly.
        let edge = |k: u64| {
            if k == n {
                WORLD_HALF_SIZE
            } else {
                -WORLD_HALF_SIZE + k as f64 * tile_size
            }
        };

        let x = self.x as u64;
        let y = self.y as u64;
        Ok(Extent::new(
            edge(x),
            -edge(y + 1),
            edge(x + 1),
            -edge(y),
        ))
    }
}

/// Latitude limit of the web mercator square.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Project WGS84 lon/lat (degrees) to web mercator meters.
///
/// Latitudes beyond the mercator limit are clamped to it.
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = lon / 180.0 * WORLD_HALF_SIZE;
    let y = (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln()
        / std::f64::consts::PI
        * WORLD_HALF_SIZE;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lonlat_to_mercator() {
        let (x, y) = lonlat_to_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);

        let (x, y) = lonlat_to_mercator(180.0, MAX_MERCATOR_LAT);
        assert!((x - WORLD_HALF_SIZE).abs() < 1e-6);
        assert!((y - WORLD_HALF_SIZE).abs() < 1.0);
    }

    #[test]
    fn test_zoom_zero_is_world() {
        let extent = TileCoord::new(0, 0, 0).extent().unwrap();
        assert_eq!(extent, WORLD_EXTENT);
    }

    #[test]
    fn test_row_zero_is_north() {
        let north = TileCoord::new(1, 0, 0).extent().unwrap();
        let south = TileCoord::new(1, 0, 1).extent().unwrap();
        assert_eq!(north.max_y, WORLD_HALF_SIZE);
        assert_eq!(north.min_y, 0.0);
        assert_eq!(south.min_y, -WORLD_HALF_SIZE);
        assert_eq!(south.max_y, 0.0);
    }

    #[test]
    fn test_out_of_grid_rejected() {
        assert!(TileCoord::new(2, 4, 0).extent().is_err());
        assert!(TileCoord::new(2, 0, 4).extent().is_err());
        assert!(TileCoord::new(MAX_ZOOM + 1, 0, 0).extent().is_err());
    }

    #[test]
    fn test_parent_children() {
        let tile = TileCoord { z: 5, x: 10, y: 15 };
        let parent = tile.parent().unwrap();
        assert_eq!(parent, TileCoord { z: 4, x: 5, y: 7 });

        let children = parent.children();
        assert!(children.contains(&tile));
    }
}
