//! The numeric grid produced by aggregation.

use map_common::{CanvasSpec, Extent, MapError, MapResult};

/// A 2-D grid of f64 values covering a canvas.
///
/// Data is row-major with row 0 at the top (north). `xs` holds pixel-centre
/// x coordinates in ascending order, `ys` pixel-centre y coordinates in
/// descending order. NaN marks no-data.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    canvas: CanvasSpec,
    data: Vec<f64>,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Aggregate {
    /// Wrap a grid of values for the canvas. The value count must match.
    pub fn new(canvas: CanvasSpec, data: Vec<f64>) -> MapResult<Self> {
        if data.len() != canvas.len() {
            return Err(MapError::InvalidRequest(format!(
                "aggregate has {} values but canvas is {}x{}",
                data.len(),
                canvas.width(),
                canvas.height()
            )));
        }
        Ok(Self {
            xs: canvas.x_centers(),
            ys: canvas.y_centers(),
            canvas,
            data,
        })
    }

    /// A grid with every cell set to `value`.
    pub fn filled(canvas: CanvasSpec, value: f64) -> Self {
        Self {
            xs: canvas.x_centers(),
            ys: canvas.y_centers(),
            data: vec![value; canvas.len()],
            canvas,
        }
    }

    pub fn canvas(&self) -> &CanvasSpec {
        &self.canvas
    }

    pub fn extent(&self) -> &Extent {
        self.canvas.extent()
    }

    pub fn width(&self) -> usize {
        self.canvas.width() as usize
    }

    pub fn height(&self) -> usize {
        self.canvas.height() as usize
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Value at (col, row), or None if out of bounds.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width() || row >= self.height() {
            return None;
        }
        self.data.get(row * self.width() + col).copied()
    }

    /// Replace the values, keeping the canvas.
    pub fn with_data(self, data: Vec<f64>) -> MapResult<Self> {
        Aggregate::new(self.canvas, data)
    }

    /// Apply `f` to every cell.
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        for v in self.data.iter_mut() {
            *v = f(*v);
        }
        self
    }

    /// Finite minimum and maximum, or None if no cell is finite.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.data)
    }

    /// True when every cell is no-data.
    pub fn is_all_nan(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// Extract the `width` x `height` window whose top-left pixel is
    /// (`col`, `row`).
    pub fn crop(&self, col: usize, row: usize, width: u32, height: u32) -> MapResult<Aggregate> {
        let (w, h) = (width as usize, height as usize);
        if col + w > self.width() || row + h > self.height() {
            return Err(MapError::InvalidRequest(format!(
                "crop window {}x{}+{}+{} exceeds aggregate {}x{}",
                w,
                h,
                col,
                row,
                self.width(),
                self.height()
            )));
        }

        let dx = self.canvas.cell_width();
        let dy = self.canvas.cell_height();
        let src = self.canvas.extent();
        let min_x = src.min_x + col as f64 * dx;
        let max_y = src.max_y - row as f64 * dy;
        let extent = Extent::new(min_x, max_y - h as f64 * dy, min_x + w as f64 * dx, max_y);

        let mut data = Vec::with_capacity(w * h);
        for r in row..row + h {
            let start = r * self.width() + col;
            data.extend_from_slice(&self.data[start..start + w]);
        }
        Aggregate::new(CanvasSpec::new(width, height, extent)?, data)
    }
}

/// Finite minimum and maximum of a slice.
pub fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasSpec {
        CanvasSpec::new(3, 2, Extent::new(0.0, 0.0, 3.0, 2.0)).unwrap()
    }

    #[test]
    fn test_length_checked() {
        assert!(Aggregate::new(canvas(), vec![0.0; 5]).is_err());
        assert!(Aggregate::new(canvas(), vec![0.0; 6]).is_ok());
    }

    #[test]
    fn test_finite_range_skips_nan() {
        let agg = Aggregate::new(canvas(), vec![f64::NAN, 2.0, -1.0, 5.0, f64::NAN, 0.0]).unwrap();
        assert_eq!(agg.finite_range(), Some((-1.0, 5.0)));
        assert!(Aggregate::filled(canvas(), f64::NAN).finite_range().is_none());
    }

    #[test]
    fn test_crop() {
        let agg = Aggregate::new(canvas(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let cropped = agg.crop(1, 1, 2, 1).unwrap();
        assert_eq!(cropped.data(), &[5.0, 6.0]);
        assert_eq!(*cropped.extent(), Extent::new(1.0, 0.0, 3.0, 1.0));
        assert!(agg.crop(2, 0, 2, 1).is_err());
    }
}
