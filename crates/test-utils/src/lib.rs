//! Shared test utilities for the map shading workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic grid, point and polygon generators
//! - On-disk fixtures (GeoJSON, ESRI ASCII grids, source configs)
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures, create_elevation_grid};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of extents given as `(xmin, ymin, xmax, ymax)`.
#[macro_export]
macro_rules! assert_extent_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let l = $left;
        let r = $right;
        $crate::assert_approx_eq!(l.0, r.0, $epsilon);
        $crate::assert_approx_eq!(l.1, r.1, $epsilon);
        $crate::assert_approx_eq!(l.2, r.2, $epsilon);
        $crate::assert_approx_eq!(l.3, r.3, $epsilon);
    }};
}
