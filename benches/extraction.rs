//! Benchmarking of the peak extraction and complete unit processing
use ndarray::Array2;
use rssnr::prelude::{extract_peak, Config, PickRow, PickTable, Pipeline, RadarFrame};

extern crate criterion;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

const SLOW: usize = 2_000;
const FAST: usize = 1_000;
const DT: f64 = 1.0E-8;

fn synthetic_frame(rng: &mut StdRng) -> RadarFrame {
    let data = Array2::from_shape_fn((SLOW, FAST), |_| rng.gen_range(0.0..1.0));
    let time = (0..FAST).map(|i| i as f64 * DT).collect();
    RadarFrame::new(data, time)
        .unwrap()
        .with_gps_time((0..SLOW).map(|i| i as f64 * 0.1).collect())
        .unwrap()
}

fn synthetic_picks() -> PickTable {
    (0..SLOW)
        .map(|i| {
            PickRow::new(300.0, 1500.0, 2000.0, 1200.0, -80.0 - i as f64 * 1.0E-4, 0.0)
                .with_time_of_day(i as f64 * 0.1)
        })
        .collect()
}

fn benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let frame = synthetic_frame(&mut rng);
    let picks = synthetic_picks();

    let mut extraction_grp = c.benchmark_group("extraction");

    for half_width in [0, 18, 100] {
        extraction_grp.bench_function(&format!("peak/hw={}", half_width), |b| {
            b.iter(|| {
                for along_track in 0..SLOW {
                    let _ = black_box(extract_peak(&frame, along_track, 5.0E-6, half_width));
                }
            })
        });
    }

    let pipeline = Pipeline::new(Config::default()).unwrap();
    extraction_grp.bench_function("unit/2000x1000", |b| {
        b.iter(|| {
            let _ = black_box(pipeline.process(&frame, &picks));
        })
    });

    extraction_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
