use std::hint::black_box;
use std::io;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use seirs_grid::model::{ContextSeirsExt, SeirsState, TrajectoryRow};
use seirs_grid::prelude::*;

static SEED: u64 = 987_654_321;

fn bench_parameters() -> Parameters {
    Parameters {
        num_days: 30,
        ..Parameters::default()
    }
}

/// A single day of the default 20,000 agent population.
fn day_step(c: &mut Criterion) {
    let parameters = bench_parameters();
    c.bench_function("advance one day", |bencher| {
        bencher.iter_batched(
            || {
                let mut rng = Xorshift64::new(SEED);
                let state = SeirsState::new(&parameters, &mut rng);
                (state, rng)
            },
            |(mut state, mut rng)| {
                state.advance_day(&mut rng, parameters.beta);
                black_box(state)
            },
            BatchSize::LargeInput,
        );
    });
}

/// Thirty days through the `Context`, trajectory discarded.
fn thirty_days(c: &mut Criterion) {
    let parameters = bench_parameters();
    c.bench_function("run thirty days", |bencher| {
        bencher.iter_with_large_drop(|| {
            let mut context = Context::new();
            context.init_random(SEED);
            context.add_report_writer::<TrajectoryRow>(Box::new(io::sink()));
            context
                .init_seirs_model(parameters)
                .expect("default parameters are valid");
            context.run_seirs_model().expect("sink never fails");
            context
        });
    });
}

criterion_group!(day_benches, day_step, thirty_days);
criterion_main!(day_benches);
