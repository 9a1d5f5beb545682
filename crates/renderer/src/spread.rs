//! Dilation of visible pixels so sparse data stays visible at low zooms.

use rayon::prelude::*;
use tracing::debug;

use crate::image::RenderedImage;

/// Largest spread radius honoured, in pixels.
pub const MAX_SPREAD_PX: u32 = 32;

/// Density threshold used by [`dynspread`].
pub const DYNSPREAD_THRESHOLD: f64 = 1.0;

/// Spread by increasing radii `0..=max_px` until the image density exceeds
/// `threshold`, returning the last spread image.
///
/// An image with no visible pixel is returned as is.
pub fn dynspread(image: RenderedImage, max_px: u32, threshold: f64) -> RenderedImage {
    let max_px = max_px.min(MAX_SPREAD_PX);
    if max_px == 0 || image.is_fully_transparent() {
        return image;
    }

    let mut px = 0;
    let mut out = spread(&image, 0);
    while px < max_px {
        if density(&out) > threshold {
            break;
        }
        px += 1;
        out = spread(&image, px);
    }

    debug!(px, max_px, "Dynamic spread");
    out
}

/// Fill every transparent pixel from the highest-alpha pixel within a
/// circular kernel of radius `px`. Opaque pixels are left unchanged.
pub fn spread(image: &RenderedImage, px: u32) -> RenderedImage {
    if px == 0 {
        return image.clone();
    }

    let width = image.width() as i64;
    let height = image.height() as i64;
    let src = image.pixels();
    let r = px as i64;
    let kernel: Vec<(i64, i64)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    let mut out = src.to_vec();
    out.par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(row, row_out)| {
            let row = row as i64;
            for col in 0..width {
                let o = col as usize * 4;
                if row_out[o + 3] > 0 {
                    continue;
                }

                let mut best: Option<usize> = None;
                let mut best_alpha = 0u8;
                for &(dx, dy) in &kernel {
                    let (c, rr) = (col + dx, row + dy);
                    if c < 0 || rr < 0 || c >= width || rr >= height {
                        continue;
                    }
                    let i = ((rr * width + c) * 4) as usize;
                    if src[i + 3] > best_alpha {
                        best_alpha = src[i + 3];
                        best = Some(i);
                    }
                }

                if let Some(i) = best {
                    row_out[o..o + 4].copy_from_slice(&src[i..i + 4]);
                }
            }
        });

    // Same dimensions as the source, so the buffer length always matches.
    RenderedImage::new(out, image.width(), image.height(), *image.extent())
        .unwrap_or_else(|_| image.clone())
}

/// Share of visible pixels that have a visible 8-neighbour, in [0, 1].
/// Zero for an image with no visible pixel.
pub fn density(image: &RenderedImage) -> f64 {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let pixels = image.pixels();
    let visible = |c: i64, r: i64| -> bool {
        c >= 0
            && r >= 0
            && c < width
            && r < height
            && pixels[((r * width + c) * 4 + 3) as usize] > 0
    };

    let mut total = 0usize;
    let mut with_neighbour = 0usize;
    for r in 0..height {
        for c in 0..width {
            if !visible(c, r) {
                continue;
            }
            total += 1;
            let has_neighbour = (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                .any(|(dx, dy)| (dx, dy) != (0, 0) && visible(c + dx, r + dy));
            if has_neighbour {
                with_neighbour += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        with_neighbour as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::Extent;

    fn single_dot(size: u32, at: (u32, u32)) -> RenderedImage {
        let mut pixels = vec![0u8; (size * size * 4) as usize];
        let i = ((at.1 * size + at.0) * 4) as usize;
        pixels[i..i + 4].copy_from_slice(&[10, 20, 30, 255]);
        RenderedImage::new(pixels, size, size, Extent::new(0.0, 0.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let img = single_dot(5, (2, 2));
        assert_eq!(dynspread(img.clone(), 0, DYNSPREAD_THRESHOLD), img);
        assert_eq!(spread(&img, 0), img);
    }

    #[test]
    fn test_spread_circular_kernel() {
        let img = single_dot(7, (3, 3));
        let out = spread(&img, 2);
        // Radius 2 disc: 13 pixels.
        assert_eq!(out.opaque_count(), 13);
        assert_eq!(out.pixel(3, 1).unwrap().to_array(), [10, 20, 30, 255]);
        assert_eq!(out.pixel(1, 1).unwrap().a, 0);
    }

    #[test]
    fn test_density() {
        let img = single_dot(5, (2, 2));
        assert_eq!(density(&img), 0.0);
        assert_eq!(density(&spread(&img, 1)), 1.0);
    }

    #[test]
    fn test_dynspread_threshold_one_reaches_max() {
        let img = single_dot(9, (4, 4));
        let out = dynspread(img.clone(), 2, DYNSPREAD_THRESHOLD);
        assert_eq!(out, spread(&img, 2));
    }

    #[test]
    fn test_dynspread_stops_when_dense() {
        let img = single_dot(9, (4, 4));
        let out = dynspread(img.clone(), 3, 0.5);
        assert_eq!(out, spread(&img, 1));
    }

    #[test]
    fn test_radius_capped() {
        let img = single_dot(3, (1, 1));
        let out = dynspread(img.clone(), 1000, DYNSPREAD_THRESHOLD);
        assert_eq!(out, spread(&img, MAX_SPREAD_PX));
    }

    #[test]
    fn test_dynspread_empty_image_unchanged() {
        let img = RenderedImage::new(vec![0u8; 6 * 6 * 4], 6, 6, Extent::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(density(&img), 0.0);
        assert_eq!(dynspread(img.clone(), MAX_SPREAD_PX, DYNSPREAD_THRESHOLD), img);
    }
}
