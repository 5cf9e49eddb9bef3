mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hii_driver::fieldgraph::edt::distance_to_sources;
use hii_driver::fieldgraph::focal::focal_max;

const GRID_SIZES: [usize; 4] = [64, 128, 256, 512];

fn distance_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("fieldgraph/distance_to_sources");

    for &size in &GRID_SIZES {
        let grid = common::square_grid(size);
        let sparse = common::road_network(&grid, 32);
        let dense = common::road_network(&grid, 4);
        group.throughput(common::elements_throughput(size * size));

        group.bench_with_input(BenchmarkId::new("sparse", size), &sparse, |b, input| {
            b.iter(|| black_box(distance_to_sources(black_box(input), 15_000.0)));
        });

        group.bench_with_input(BenchmarkId::new("dense", size), &dense, |b, input| {
            b.iter(|| black_box(distance_to_sources(black_box(input), 500.0)));
        });
    }

    group.finish();
}

fn focal_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("fieldgraph/focal_max");

    for &size in &GRID_SIZES {
        let grid = common::square_grid(size);
        let input = common::road_network(&grid, 8);
        group.throughput(common::elements_throughput(size * size));

        for radius in [1usize, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("r{radius}"), size),
                &input,
                |b, input| {
                    b.iter(|| black_box(focal_max(black_box(input), radius)));
                },
            );
        }
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = distance_benches, focal_benches
}
criterion_main!(benches);
