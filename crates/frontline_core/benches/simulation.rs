//! Simulation benchmarks for frontline_core.
//!
//! Run with: `cargo bench -p frontline_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use frontline_core::ai::Difficulty;
use frontline_core::combat::TargetIndex;
use frontline_test_utils::fixtures::{skirmish, standard_simulation};

/// Ticking a contested skirmish and a full opening.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_600_ticks", |b| {
        b.iter_batched(
            || skirmish(42),
            |mut sim| {
                for _ in 0..600 {
                    black_box(sim.tick());
                }
                sim.state_hash()
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("elite_opening_3600_ticks", |b| {
        b.iter_batched(
            || standard_simulation(7, Difficulty::Elite),
            |mut sim| {
                for _ in 0..3600 {
                    sim.tick();
                }
                black_box(sim.world().stats.enemy_units_produced)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Snapshot cost of the per-tick target index.
pub fn target_index_benchmark(c: &mut Criterion) {
    let mut sim = skirmish(3);
    for _ in 0..120 {
        sim.tick();
    }
    c.bench_function("target_index_build", |b| {
        b.iter(|| black_box(TargetIndex::build(sim.world())));
    });
}

criterion_group!(benches, simulation_benchmark, target_index_benchmark);
criterion_main!(benches);
