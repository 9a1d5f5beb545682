//! Benchmarks for shading, spreading and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench shade_benchmarks

use aggregation::Aggregate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use map_common::{CanvasSpec, Extent};
use renderer::{dynspread, shade, ColorMap, ShadeHow, DYNSPREAD_THRESHOLD};
use test_utils::{create_elevation_grid, create_point_cloud};

fn elevation_aggregate(size: u32) -> Aggregate {
    let canvas = CanvasSpec::new(size, size, Extent::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    Aggregate::new(canvas, create_elevation_grid(size as usize, size as usize)).unwrap()
}

fn sparse_aggregate(size: u32, points: usize) -> Aggregate {
    let canvas = CanvasSpec::new(size, size, Extent::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    let mut data = vec![f64::NAN; canvas.len()];
    for (x, y, v) in create_point_cloud(points, (0.0, 0.0, 1.0, 1.0), 7) {
        if let Some((col, row)) = canvas.pixel_of(x, y) {
            data[row * size as usize + col] = v;
        }
    }
    Aggregate::new(canvas, data).unwrap()
}

// =============================================================================
// SHADE BENCHMARKS
// =============================================================================

fn bench_shade(c: &mut Criterion) {
    let mut group = c.benchmark_group("shade");
    let cmap = ColorMap::default();

    for size in [256u32, 512] {
        let agg = elevation_aggregate(size);
        group.throughput(Throughput::Elements((size * size) as u64));

        for how in [ShadeHow::Linear, ShadeHow::Log, ShadeHow::EqHist] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", how), size),
                &agg,
                |b, agg| b.iter(|| shade(black_box(agg), &cmap, how, None).unwrap()),
            );
        }
    }

    group.finish();
}

// =============================================================================
// SPREAD / ENCODE BENCHMARKS
// =============================================================================

fn bench_dynspread(c: &mut Criterion) {
    let agg = sparse_aggregate(256, 500);
    let img = shade(&agg, &ColorMap::default(), ShadeHow::Linear, None).unwrap();

    c.bench_function("dynspread_256_r3", |b| {
        b.iter(|| dynspread(black_box(img.clone()), 3, DYNSPREAD_THRESHOLD))
    });
}

fn bench_png(c: &mut Criterion) {
    let agg = elevation_aggregate(256);
    let img = shade(&agg, &ColorMap::default(), ShadeHow::Linear, None).unwrap();

    c.bench_function("png_encode_256", |b| b.iter(|| black_box(&img).to_png().unwrap()));
}

criterion_group!(benches, bench_shade, bench_dynspread, bench_png);
criterion_main!(benches);
