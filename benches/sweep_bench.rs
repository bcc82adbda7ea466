//! Sweep benchmarks over a synthetic rolling terrain.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use viewshed::{point_visibility, visibility_map, HeightGrid, Parallelism, Strategy, SweepConfig};

fn rolling_terrain(side: usize) -> HeightGrid {
    HeightGrid::from_fn(side, side, |x, y| {
        let fx = (x as f32 * 0.13).sin() * 40.0;
        let fy = (y as f32 * 0.07).cos() * 25.0;
        (fx + fy) as i16 + 100
    })
    .expect("non-empty terrain")
}

fn bench_visibility_map(c: &mut Criterion) {
    let grid = rolling_terrain(64);
    let mut group = c.benchmark_group("visibility_map");
    group.throughput(Throughput::Elements(grid.len() as u64));
    group.sample_size(10);

    for strategy in [Strategy::RayCast, Strategy::Bresenham, Strategy::Voxel] {
        let config = SweepConfig::for_grid(&grid)
            .with_radius(16)
            .with_num_angles(180)
            .with_strategy(strategy)
            .with_parallelism(Parallelism::Threads { threads: None });
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &config, |b, config| {
            b.iter(|| visibility_map(black_box(&grid), config).expect("sweep"))
        });
    }
    group.finish();
}

fn bench_point_visibility(c: &mut Criterion) {
    let grid = rolling_terrain(512);
    let mut group = c.benchmark_group("point_visibility");

    for strategy in [Strategy::RayCast, Strategy::Bresenham, Strategy::Voxel] {
        let config = SweepConfig::for_grid(&grid)
            .with_radius(200)
            .with_num_angles(1440)
            .with_strategy(strategy)
            .with_vantage_point(256, 256);
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &config, |b, config| {
            b.iter(|| point_visibility(black_box(&grid), config).expect("sweep"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_visibility_map, bench_point_visibility);
criterion_main!(benches);
