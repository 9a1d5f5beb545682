//! Tests for spreading sparse pixels.

use aggregation::Aggregate;
use map_common::{CanvasSpec, Extent};
use renderer::{density, dynspread, shade, spread, ColorMap, ShadeHow, DYNSPREAD_THRESHOLD};

/// A shaded 16x16 image with isolated points at the given pixels.
fn sparse_image(points: &[(usize, usize)]) -> renderer::RenderedImage {
    let canvas = CanvasSpec::new(16, 16, Extent::new(0.0, 0.0, 16.0, 16.0)).unwrap();
    let mut data = vec![f64::NAN; 256];
    for (i, &(col, row)) in points.iter().enumerate() {
        data[row * 16 + col] = i as f64 + 1.0;
    }
    let agg = Aggregate::new(canvas, data).unwrap();
    shade(&agg, &ColorMap::default(), ShadeHow::Linear, None).unwrap()
}

#[test]
fn test_spread_keeps_existing_pixels() {
    let img = sparse_image(&[(2, 2), (12, 12)]);
    let out = spread(&img, 2);

    assert_eq!(out.pixel(2, 2), img.pixel(2, 2));
    assert_eq!(out.pixel(12, 12), img.pixel(12, 12));
    assert_eq!(out.pixel(4, 2), img.pixel(2, 2));
    assert_eq!(out.pixel(7, 7).unwrap().a, 0);
}

#[test]
fn test_spread_clipped_at_border() {
    let img = sparse_image(&[(0, 0)]);
    // Quarter of a radius-1 disc plus the centre.
    assert_eq!(spread(&img, 1).opaque_count(), 3);
}

#[test]
fn test_dynspread_grows_isolated_points() {
    let img = sparse_image(&[(3, 3), (11, 11)]);
    assert_eq!(density(&img), 0.0);

    let out = dynspread(img.clone(), 2, DYNSPREAD_THRESHOLD);
    assert!(out.opaque_count() > img.opaque_count());
    assert_eq!(out, spread(&img, 2));
}

#[test]
fn test_dynspread_zero_radius_is_identity() {
    let img = sparse_image(&[(5, 5)]);
    assert_eq!(dynspread(img.clone(), 0, DYNSPREAD_THRESHOLD), img);
}

#[test]
fn test_dense_image_is_left_alone() {
    let canvas = CanvasSpec::new(8, 8, Extent::new(0.0, 0.0, 8.0, 8.0)).unwrap();
    let agg = Aggregate::new(canvas, (0..64).map(|v| v as f64).collect()).unwrap();
    let img = shade(&agg, &ColorMap::default(), ShadeHow::Linear, None).unwrap();

    assert_eq!(density(&img), 1.0);
    assert_eq!(dynspread(img.clone(), 4, 0.5), img);
}

#[test]
fn test_transparent_image_stays_transparent() {
    let img = sparse_image(&[]);
    let out = dynspread(img, 3, DYNSPREAD_THRESHOLD);
    assert!(out.is_fully_transparent());
}
