//! Tests for shading aggregates into images.

use aggregation::Aggregate;
use map_common::{CanvasSpec, Extent};
use renderer::{shade, Color, ColorMap, ShadeHow};
use test_utils::{create_elevation_grid, create_grid_with_nans};

fn aggregate(width: u32, height: u32, data: Vec<f64>) -> Aggregate {
    let canvas = CanvasSpec::new(width, height, Extent::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    Aggregate::new(canvas, data).unwrap()
}

fn grey() -> ColorMap {
    ColorMap::ramp(&["black", "white"]).unwrap()
}

// ============================================================================
// Ramp shading
// ============================================================================

#[test]
fn test_image_matches_canvas() {
    let agg = aggregate(32, 16, create_elevation_grid(32, 16));
    let img = shade(&agg, &ColorMap::default(), ShadeHow::Linear, None).unwrap();

    assert_eq!(img.width(), 32);
    assert_eq!(img.height(), 16);
    assert_eq!(img.extent(), agg.extent());
    assert_eq!(img.opaque_count(), 32 * 16);
}

#[test]
fn test_span_endpoints_map_to_ramp_ends() {
    let agg = aggregate(3, 1, vec![0.0, 50.0, 100.0]);
    let img = shade(&agg, &grey(), ShadeHow::Linear, Some((0.0, 100.0))).unwrap();

    assert_eq!(img.pixel(0, 0), Some(Color::rgb(0, 0, 0)));
    assert_eq!(img.pixel(2, 0), Some(Color::rgb(255, 255, 255)));
}

#[test]
fn test_values_outside_span_are_clamped() {
    let agg = aggregate(2, 1, vec![-10.0, 500.0]);
    let img = shade(&agg, &grey(), ShadeHow::Linear, Some((0.0, 100.0))).unwrap();

    assert_eq!(img.pixel(0, 0), Some(Color::rgb(0, 0, 0)));
    assert_eq!(img.pixel(1, 0), Some(Color::rgb(255, 255, 255)));
}

#[test]
fn test_nan_cells_are_transparent() {
    let data = create_grid_with_nans(4, 4, 7.0, &[(1, 1), (3, 2)]);
    let agg = aggregate(4, 4, data);
    let img = shade(&agg, &grey(), ShadeHow::Linear, None).unwrap();

    assert_eq!(img.opaque_count(), 14);
    assert_eq!(img.pixel(1, 1).unwrap().a, 0);
    assert_eq!(img.pixel(3, 2).unwrap().a, 0);
}

#[test]
fn test_all_nan_gives_transparent_image() {
    let agg = aggregate(4, 4, vec![f64::NAN; 16]);
    for how in [ShadeHow::Linear, ShadeHow::Log, ShadeHow::Cbrt, ShadeHow::EqHist] {
        let img = shade(&agg, &grey(), how, None).unwrap();
        assert!(img.is_fully_transparent());
    }
}

#[test]
fn test_every_curve_is_monotonic() {
    let data: Vec<f64> = (0..64).map(|i| (i * i) as f64).collect();
    let agg = aggregate(64, 1, data);

    for how in [ShadeHow::Linear, ShadeHow::Log, ShadeHow::Cbrt, ShadeHow::EqHist] {
        let img = shade(&agg, &grey(), how, None).unwrap();
        let levels: Vec<u8> = (0..64).map(|c| img.pixel(c, 0).unwrap().r).collect();
        assert!(levels.windows(2).all(|w| w[0] <= w[1]), "{:?}", how);
        assert_eq!(levels[0], 0);
        assert_eq!(levels[63], 255);
    }
}

#[test]
fn test_log_lifts_low_values() {
    let agg = aggregate(3, 1, vec![0.0, 10.0, 1000.0]);
    let linear = shade(&agg, &grey(), ShadeHow::Linear, None).unwrap();
    let log = shade(&agg, &grey(), ShadeHow::Log, None).unwrap();

    assert!(log.pixel(1, 0).unwrap().r > linear.pixel(1, 0).unwrap().r);
}

// ============================================================================
// Categorical shading
// ============================================================================

#[test]
fn test_categorical_exact_match() {
    let cmap = ColorMap::categorical(&[(1.0, "red"), (2.0, "#00ff00")]).unwrap();
    let agg = aggregate(4, 1, vec![1.0, 2.0, 3.0, f64::NAN]);
    let img = shade(&agg, &cmap, ShadeHow::EqHist, Some((0.0, 1.0))).unwrap();

    assert_eq!(img.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
    assert_eq!(img.pixel(1, 0), Some(Color::rgb(0, 255, 0)));
    assert_eq!(img.pixel(2, 0).unwrap().a, 0);
    assert_eq!(img.pixel(3, 0).unwrap().a, 0);
}

#[test]
fn test_shading_is_deterministic() {
    let agg = aggregate(64, 64, create_elevation_grid(64, 64));
    let a = shade(&agg, &ColorMap::default(), ShadeHow::EqHist, None).unwrap();
    let b = shade(&agg, &ColorMap::default(), ShadeHow::EqHist, None).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
}
