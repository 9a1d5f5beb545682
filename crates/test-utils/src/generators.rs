//! Test data generators for synthetic map data.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite. Grids are row-major with row 0 at the top.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates an elevation-like grid: a single smooth hill centred in the grid.
///
/// Values range from 100 at the corners to roughly 1100 at the summit, so
/// the grid never contains exact zeros.
pub fn create_elevation_grid(width: usize, height: usize) -> Vec<f64> {
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let radius = (cx * cx + cy * cy).sqrt().max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            let d = (dx * dx + dy * dy).sqrt() / radius;
            data.push(100.0 + 1000.0 * (1.0 - d * d).max(0.0));
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at specified `(col, row)` positions,
/// `fill` elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    fill: f64,
    nan_positions: &[(usize, usize)],
) -> Vec<f64> {
    let mut data = vec![fill; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f64::NAN;
        }
    }
    data
}

/// Deterministic scattered points inside an extent, each with a value.
///
/// Returns `(x, y, value)` triples; values are in `[0, 100)`.
pub fn create_point_cloud(
    count: usize,
    extent: (f64, f64, f64, f64),
    seed: u32,
) -> Vec<(f64, f64, f64)> {
    let (xmin, ymin, xmax, ymax) = extent;
    (0..count as u32)
        .map(|i| {
            let hx = simple_hash(i, 0, seed);
            let hy = simple_hash(i, 1, seed);
            let hv = simple_hash(i, 2, seed);
            let fx = hx as f64 / u32::MAX as f64;
            let fy = hy as f64 / u32::MAX as f64;
            (
                xmin + fx * (xmax - xmin),
                ymin + fy * (ymax - ymin),
                (hv % 10_000) as f64 / 100.0,
            )
        })
        .collect()
}

/// Closed square ring centred on `(cx, cy)` with half side `half`.
pub fn square_ring(cx: f64, cy: f64, half: f64) -> Vec<[f64; 2]> {
    vec![
        [cx - half, cy - half],
        [cx + half, cy - half],
        [cx + half, cy + half],
        [cx - half, cy + half],
        [cx - half, cy - half],
    ]
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates RGBA pixel data for a simple gradient pattern.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}

/// Creates RGBA pixel data that uses only a handful of colours, suitable
/// for exercising indexed PNG encoding.
pub fn create_palette_pixels(width: usize, height: usize) -> Vec<u8> {
    let palette: [(u8, u8, u8); 6] = [
        (68, 1, 84),
        (59, 82, 139),
        (33, 145, 140),
        (94, 201, 98),
        (253, 231, 37),
        (255, 255, 255),
    ];

    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let idx = ((x + y) * palette.len() / (width + height).max(1)).min(palette.len() - 1);
            let (r, g, b) = palette[idx];
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[11], 1001.0);
    }

    #[test]
    fn test_elevation_grid_has_no_zeros() {
        let grid = create_elevation_grid(16, 12);
        assert_eq!(grid.len(), 192);
        assert!(grid.iter().all(|&v| v >= 100.0 && v <= 1100.0));
        let corner = grid[0];
        let centre = grid[6 * 16 + 8];
        assert!(centre > corner);
    }

    #[test]
    fn test_point_cloud_is_deterministic_and_bounded() {
        let a = create_point_cloud(100, (-10.0, -5.0, 10.0, 5.0), 7);
        let b = create_point_cloud(100, (-10.0, -5.0, 10.0, 5.0), 7);
        assert_eq!(a, b);
        for (x, y, v) in a {
            assert!((-10.0..=10.0).contains(&x));
            assert!((-5.0..=5.0).contains(&y));
            assert!((0.0..100.0).contains(&v));
        }
    }

    #[test]
    fn test_grid_with_nans() {
        let grid = create_grid_with_nans(3, 3, 1.0, &[(1, 1), (5, 5)]);
        assert!(grid[4].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn test_palette_pixels_few_colors() {
        let pixels = create_palette_pixels(32, 32);
        let mut colors: Vec<&[u8]> = pixels.chunks_exact(4).collect();
        colors.sort();
        colors.dedup();
        assert!(colors.len() <= 6);
    }
}
