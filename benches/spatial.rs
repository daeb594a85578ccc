//! Benchmarking of the spatial index and polar projections
use rssnr::prelude::{IceSheet, PlanarPoint, SpatialIndex};

extern crate criterion;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_points(rng: &mut StdRng, n: usize) -> Vec<PlanarPoint> {
    (0..n)
        .map(|_| PlanarPoint::new(rng.gen_range(-1.0E6..1.0E6), rng.gen_range(-1.0E6..1.0E6)))
        .collect()
}

fn benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let reference = random_points(&mut rng, 50_000);
    let queries = random_points(&mut rng, 10_000);

    let mut index_grp = c.benchmark_group("spatial");

    index_grp.bench_function("build/50k", |b| {
        b.iter(|| {
            black_box(SpatialIndex::build(&reference));
        })
    });

    let index = SpatialIndex::build(&reference);

    index_grp.bench_function("nearest/10k", |b| {
        b.iter(|| {
            black_box(index.nearest(&queries));
        })
    });

    index_grp.bench_function("within_radius/10k", |b| {
        b.iter(|| {
            black_box(index.within_radius(&queries, 5000.0));
        })
    });

    index_grp.finish();

    let mut projection_grp = c.benchmark_group("projection");
    let lat = (0..10_000).map(|i| -60.0 - i as f64 * 0.003).collect::<Vec<_>>();
    let lon = (0..10_000).map(|i| i as f64 * 0.036 - 180.0).collect::<Vec<_>>();

    projection_grp.bench_function("project/10k", |b| {
        b.iter(|| {
            black_box(rssnr::projection::project_all(&lat, &lon, IceSheet::Antarctica));
        })
    });

    let points = rssnr::projection::project_all(&lat, &lon, IceSheet::Antarctica);
    projection_grp.bench_function("unproject/10k", |b| {
        b.iter(|| {
            for point in points.iter() {
                black_box(IceSheet::Antarctica.unproject(*point));
            }
        })
    });

    projection_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
