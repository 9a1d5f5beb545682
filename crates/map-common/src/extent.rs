//! Projected extents and request-to-extent resolution.

use serde::{Deserialize, Serialize};

use crate::{MapError, MapResult, TileCoord};

/// A rectangular extent in projected coordinates (web mercator meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Create a new extent from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create an extent and check that it is non-degenerate.
    pub fn checked(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MapResult<Self> {
        let extent = Self::new(min_x, min_y, max_x, max_y);
        extent.validate()?;
        Ok(extent)
    }

    /// Parse a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    pub fn from_wms_string(s: &str) -> MapResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(MapError::InvalidRequest(format!(
                "invalid bbox '{}', expected 'minx,miny,maxx,maxy'",
                s
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                MapError::InvalidRequest(format!("invalid number in bbox: {}", part))
            })?;
        }

        Self::checked(values[0], values[1], values[2], values[3])
    }

    /// Check ordering and finiteness of the corners.
    pub fn validate(&self) -> MapResult<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(MapError::InvalidRequest(format!(
                "extent contains non-finite coordinates: {:?}",
                self
            )));
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(MapError::InvalidRequest(format!(
                "extent must satisfy xmin < xmax and ymin < ymax, got ({}, {}, {}, {})",
                self.min_x, self.min_y, self.max_x, self.max_y
            )));
        }
        Ok(())
    }

    /// Width of the extent in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the extent in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this extent intersects another.
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if a point is contained within this extent (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if `other` lies entirely inside this extent.
    pub fn contains(&self, other: &Extent) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Grow the extent by the given distances on each side.
    pub fn expanded(&self, dx: f64, dy: f64) -> Extent {
        Extent::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// The spatial part of a render request before it is resolved.
///
/// A tile address takes precedence over explicit bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtentRequest {
    pub tile: Option<TileCoord>,
    pub xmin: Option<f64>,
    pub ymin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymax: Option<f64>,
}

impl ExtentRequest {
    pub fn from_tile(tile: TileCoord) -> Self {
        Self {
            tile: Some(tile),
            ..Default::default()
        }
    }

    pub fn from_bounds(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            tile: None,
            xmin: Some(xmin),
            ymin: Some(ymin),
            xmax: Some(xmax),
            ymax: Some(ymax),
        }
    }

    /// Zoom level carried by the request, if it is a tile request.
    pub fn zoom(&self) -> Option<u32> {
        self.tile.map(|t| t.z)
    }

    /// Resolve the request into a projected extent.
    pub fn resolve(&self) -> MapResult<Extent> {
        if let Some(tile) = &self.tile {
            return tile.extent();
        }

        match (self.xmin, self.ymin, self.xmax, self.ymax) {
            (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) => {
                Extent::checked(xmin, ymin, xmax, ymax)
            }
            _ => Err(MapError::InvalidRequest("extent must be provided".to_string())),
        }
    }
}
