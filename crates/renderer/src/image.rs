//! The RGBA image produced by shading.

use map_common::{CanvasSpec, Extent, MapError, MapResult};

use crate::color::Color;
use crate::png;

/// RGBA8 pixels (row 0 at the top) plus the extent they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    extent: Extent,
}

impl RenderedImage {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, extent: Extent) -> MapResult<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return Err(MapError::Encode(format!(
                "pixel buffer of {} bytes does not match {}x{} RGBA",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
            extent,
        })
    }

    /// A fully transparent image over a canvas.
    pub fn transparent(canvas: &CanvasSpec) -> Self {
        Self {
            pixels: vec![0; canvas.len() * 4],
            width: canvas.width(),
            height: canvas.height(),
            extent: *canvas.extent(),
        }
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

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, col: u32, row: u32) -> Option<Color> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let i = (row as usize * self.width as usize + col as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }

    /// Number of pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.opaque_count() == 0
    }

    /// Extract the `width` x `height` window whose top-left pixel is
    /// (`col`, `row`).
    pub fn crop(&self, col: u32, row: u32, width: u32, height: u32) -> MapResult<RenderedImage> {
        if col + width > self.width || row + height > self.height {
            return Err(MapError::Encode(format!(
                "crop window {}x{}+{}+{} exceeds image {}x{}",
                width, height, col, row, self.width, self.height
            )));
        }

        let dx = self.extent.width() / self.width as f64;
        let dy = self.extent.height() / self.height as f64;
        let min_x = self.extent.min_x + col as f64 * dx;
        let max_y = self.extent.max_y - row as f64 * dy;
        let extent = Extent::new(
            min_x,
            max_y - height as f64 * dy,
            min_x + width as f64 * dx,
            max_y,
        );

        let src_stride = self.width as usize * 4;
        let row_bytes = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for r in row..row + height {
            let start = r as usize * src_stride + col as usize * 4;
            pixels.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }

        RenderedImage::new(pixels, width, height, extent)
    }

    /// Crop to the pixels covering `canvas`, which must lie on this image's
    /// pixel grid. Returns the image unchanged when it already matches.
    pub fn crop_to_canvas(self, canvas: &CanvasSpec) -> MapResult<RenderedImage> {
        if self.width == canvas.width() && self.height == canvas.height() {
            return Ok(self);
        }
        let dx = self.extent.width() / self.width as f64;
        let dy = self.extent.height() / self.height as f64;
        let col = ((canvas.extent().min_x - self.extent.min_x) / dx).round().max(0.0) as u32;
        let row = ((self.extent.max_y - canvas.extent().max_y) / dy).round().max(0.0) as u32;
        let mut cropped = self.crop(col, row, canvas.width(), canvas.height())?;
        cropped.extent = *canvas.extent();
        Ok(cropped)
    }

    /// Encode as PNG (indexed when the palette allows).
    pub fn to_png(&self) -> MapResult<Vec<u8>> {
        png::encode_png(&self.pixels, self.width as usize, self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_4x2() -> RenderedImage {
        let mut pixels = Vec::new();
        for i in 0..8u8 {
            pixels.extend_from_slice(&[i, 0, 0, 255]);
        }
        RenderedImage::new(pixels, 4, 2, Extent::new(0.0, 0.0, 4.0, 2.0)).unwrap()
    }

    #[test]
    fn test_crop() {
        let img = image_4x2();
        let cropped = img.crop(1, 1, 2, 1).unwrap();
        assert_eq!(cropped.pixels(), &[5, 0, 0, 255, 6, 0, 0, 255]);
        assert_eq!(*cropped.extent(), Extent::new(1.0, 0.0, 3.0, 1.0));
    }

    #[test]
    fn test_crop_to_canvas() {
        let img = image_4x2();
        let canvas = CanvasSpec::new(2, 2, Extent::new(1.0, 0.0, 3.0, 2.0)).unwrap();
        let cropped = img.crop_to_canvas(&canvas).unwrap();
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.pixel(0, 0).unwrap().r, 1);
        assert_eq!(cropped.pixel(1, 1).unwrap().r, 6);
    }

    #[test]
    fn test_transparent() {
        let canvas = CanvasSpec::new(3, 3, Extent::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        let img = RenderedImage::transparent(&canvas);
        assert!(img.is_fully_transparent());
        assert_eq!(img.pixels().len(), 36);
    }
}
