//! Spin Benchmarks
//!
//! Throughput of the step function across settings and bonus models.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hb_engine::{MachineConfig, Run, SeededSource, VALID_LEVELS};

const SPINS_PER_ITER: u64 = 10_000;

/// Benchmark per-game spins at every setting
fn bench_spin_per_game(c: &mut Criterion) {
    let mut group = c.benchmark_group("spin_per_game");
    group.throughput(Throughput::Elements(SPINS_PER_ITER));

    for &level in VALID_LEVELS.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(level), &level, |b, &level| {
            let mut run = Run::new(level, Some(42)).unwrap();
            b.iter(|| {
                for _ in 0..SPINS_PER_ITER {
                    black_box(run.spin());
                }
            })
        });
    }

    group.finish();
}

/// Benchmark the flat-payout reduction
fn bench_spin_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("spin_flat");
    group.throughput(Throughput::Elements(SPINS_PER_ITER));

    group.bench_function("setting_1", |b| {
        let config = MachineConfig::flat_for_setting(1).unwrap();
        let mut run = Run::with_source(config, SeededSource::from_seed(42)).unwrap();
        b.iter(|| {
            for _ in 0..SPINS_PER_ITER {
                black_box(run.spin());
            }
        })
    });

    group.finish();
}

/// Benchmark run construction (config build, validation, initial draw)
fn bench_run_setup(c: &mut Criterion) {
    c.bench_function("run_setup", |b| {
        b.iter(|| black_box(Run::new(black_box(6), Some(7)).unwrap()))
    });
}

criterion_group!(benches, bench_spin_per_game, bench_spin_flat, bench_run_setup);

criterion_main!(benches);
