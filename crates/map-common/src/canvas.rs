//! Pixel canvas specification.

use serde::{Deserialize, Serialize};

use crate::{Extent, MapError, MapResult};

/// Default tile / image size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Largest width or height a client may request.
pub const MAX_CANVAS_SIZE: u32 = 4096;

/// The pixel grid a request renders into.
///
/// Row 0 is the top (max y) row. Pixel (col, row) covers the half-open cell
/// `[min_x + col * dx, min_x + (col + 1) * dx) x (max_y - (row + 1) * dy, max_y - row * dy]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSpec {
    width: u32,
    height: u32,
    extent: Extent,
}

impl CanvasSpec {
    /// Create a canvas. Both dimensions must be positive and the extent valid.
    pub fn new(width: u32, height: u32, extent: Extent) -> MapResult<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidRequest(format!(
                "canvas dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        extent.validate()?;
        Ok(Self {
            width,
            height,
            extent,
        })
    }

    /// A canvas for a client request. Like [`CanvasSpec::new`], but neither
    /// dimension may exceed [`MAX_CANVAS_SIZE`].
    pub fn for_request(width: u32, height: u32, extent: Extent) -> MapResult<Self> {
        if width > MAX_CANVAS_SIZE || height > MAX_CANVAS_SIZE {
            return Err(MapError::InvalidRequest(format!(
                "canvas {}x{} exceeds the {}px limit",
                width, height, MAX_CANVAS_SIZE
            )));
        }
        Self::new(width, height, extent)
    }

    /// A default-sized canvas (256x256) over the extent.
    pub fn tile(extent: Extent) -> MapResult<Self> {
        Self::new(DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE, extent)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel size along x in coordinate units.
    pub fn cell_width(&self) -> f64 {
        self.extent.width() / self.width as f64
    }

    /// Pixel size along y in coordinate units.
    pub fn cell_height(&self) -> f64 {
        self.extent.height() / self.height as f64
    }

    /// Pixel-centre x coordinates, ascending.
    pub fn x_centers(&self) -> Vec<f64> {
        let dx = self.cell_width();
        (0..self.width)
            .map(|col| self.extent.min_x + (col as f64 + 0.5) * dx)
            .collect()
    }

    /// Pixel-centre y coordinates, descending (row 0 is north).
    pub fn y_centers(&self) -> Vec<f64> {
        let dy = self.cell_height();
        (0..self.height)
            .map(|row| self.extent.max_y - (row as f64 + 0.5) * dy)
            .collect()
    }

    /// Fractional pixel position of a world coordinate.
    ///
    /// Column grows eastward, row grows southward; (0, 0) is the top-left
    /// corner of the canvas.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.extent.min_x) / self.cell_width();
        let row = (self.extent.max_y - y) / self.cell_height();
        (col, row)
    }

    /// Pixel containing a world coordinate, if it lies on the canvas.
    ///
    /// Points on the east or south edge belong to the last column/row.
    pub fn pixel_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() || !self.extent.contains_point(x, y) {
            return None;
        }
        let (col, row) = self.world_to_pixel(x, y);
        let col = (col.floor().max(0.0) as usize).min(self.width as usize - 1);
        let row = (row.floor().max(0.0) as usize).min(self.height as usize - 1);
        Some((col, row))
    }

    /// Canvas grown by whole pixels on each side, keeping the cell size.
    pub fn padded(&self, padding: Padding) -> MapResult<CanvasSpec> {
        if padding.is_none() {
            return Ok(*self);
        }
        let dx = self.cell_width();
        let dy = self.cell_height();
        let extent = Extent::new(
            self.extent.min_x - dx * padding.left as f64,
            self.extent.min_y - dy * padding.bottom as f64,
            self.extent.max_x + dx * padding.right as f64,
            self.extent.max_y + dy * padding.top as f64,
        );
        CanvasSpec::new(
            self.width + padding.left + padding.right,
            self.height + padding.top + padding.bottom,
            extent,
        )
    }
}

/// Whole pixels added to each side of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Padding {
    /// Padding for a fraction `p` of each dimension.
    ///
    /// A padded dimension is `round(dim * (1 + 2p))` pixels. The extra
    /// pixels are split between both sides, the far side taking the odd one.
    pub fn from_fraction(width: u32, height: u32, p: f64) -> Self {
        if p <= 0.0 || !p.is_finite() {
            return Self::default();
        }
        let extra = |dim: u32| {
            let total = (dim as f64 * (1.0 + 2.0 * p)).round() as u32;
            total.saturating_sub(dim)
        };
        let (x, y) = (extra(width), extra(height));
        Self {
            left: x / 2,
            right: x - x / 2,
            top: y / 2,
            bottom: y - y / 2,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_canvas() -> CanvasSpec {
        CanvasSpec::new(4, 2, Extent::new(0.0, 0.0, 4.0, 2.0)).unwrap()
    }

    #[test]
    fn test_rejects_zero_size() {
        assert!(CanvasSpec::new(0, 10, Extent::new(0.0, 0.0, 1.0, 1.0)).is_err());
        assert!(CanvasSpec::new(10, 0, Extent::new(0.0, 0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_request_size_limit() {
        let extent = Extent::new(0.0, 0.0, 1.0, 1.0);
        assert!(CanvasSpec::for_request(MAX_CANVAS_SIZE, MAX_CANVAS_SIZE, extent).is_ok());
        assert!(matches!(
            CanvasSpec::for_request(MAX_CANVAS_SIZE + 1, 10, extent),
            Err(MapError::InvalidRequest(_))
        ));
        assert!(CanvasSpec::for_request(10, 100_000, extent).is_err());
        assert!(CanvasSpec::for_request(0, 10, extent).is_err());
    }

    #[test]
    fn test_centers() {
        let canvas = unit_canvas();
        assert_eq!(canvas.x_centers(), vec![0.5, 1.5, 2.5, 3.5]);
        assert_eq!(canvas.y_centers(), vec![1.5, 0.5]);
    }

    #[test]
    fn test_pixel_of_edges() {
        let canvas = unit_canvas();
        assert_eq!(canvas.pixel_of(0.0, 2.0), Some((0, 0)));
        assert_eq!(canvas.pixel_of(4.0, 0.0), Some((3, 1)));
        assert_eq!(canvas.pixel_of(1.0, 1.0), Some((1, 1)));
        assert_eq!(canvas.pixel_of(4.5, 1.0), None);
    }

    #[test]
    fn test_padded_keeps_cell_size() {
        let canvas = unit_canvas();
        let padding = Padding {
            left: 2,
            right: 2,
            top: 1,
            bottom: 1,
        };
        let padded = canvas.padded(padding).unwrap();
        assert_eq!(padded.width(), 8);
        assert_eq!(padded.height(), 4);
        assert_eq!(padded.cell_width(), canvas.cell_width());
        assert_eq!(*padded.extent(), Extent::new(-2.0, -1.0, 6.0, 3.0));
        assert_eq!(canvas.padded(Padding::default()).unwrap(), canvas);
    }

    #[test]
    fn test_padded_uneven_split() {
        let canvas = unit_canvas();
        let padding = Padding {
            left: 0,
            right: 1,
            top: 1,
            bottom: 0,
        };
        let padded = canvas.padded(padding).unwrap();
        assert_eq!((padded.width(), padded.height()), (5, 3));
        assert_eq!(*padded.extent(), Extent::new(0.0, 0.0, 5.0, 3.0));
    }

    #[test]
    fn test_padding_fraction_dimensions() {
        for (dim, p) in [(10u32, 0.05), (256, 0.1), (255, 0.25), (100, 0.1), (7, 0.5)] {
            let padding = Padding::from_fraction(dim, dim, p);
            let width = dim + padding.left + padding.right;
            let height = dim + padding.top + padding.bottom;
            let expected = (dim as f64 * (1.0 + 2.0 * p)).round() as u32;
            assert_eq!(width, expected, "dim={} p={}", dim, p);
            assert_eq!(height, expected, "dim={} p={}", dim, p);
            assert!(padding.right - padding.left <= 1);
            assert!(padding.bottom - padding.top <= 1);
        }

        let padding = Padding::from_fraction(10, 10, 0.05);
        assert_eq!((padding.left, padding.right), (0, 1));
        assert!(Padding::from_fraction(256, 256, 0.0).is_none());
        assert!(Padding::from_fraction(256, 256, f64::NAN).is_none());
    }
}
