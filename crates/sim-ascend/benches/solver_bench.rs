use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sim_core::{EconomyConfig, EconomyState};

fn bench_solver(c: &mut Criterion) {
    let state = EconomyState::new(EconomyConfig::default()).unwrap();

    c.bench_function("time_to_goal 5e8", |b| {
        b.iter(|| {
            let mut ghost = state.clone();
            let _ = black_box(sim_oracle::time_to_goal(&mut ghost, 5e8));
        })
    });

    c.bench_function("solve 5e6 pruned", |b| {
        let options = sim_ascend::SolverOptions::default();
        b.iter(|| {
            let _ = black_box(sim_ascend::solve(&state, 5e6, 0, &options));
        })
    });

    c.bench_function("solve 5e8 pruned", |b| {
        let options = sim_ascend::SolverOptions::default();
        b.iter(|| {
            let _ = black_box(sim_ascend::solve(&state, 5e8, 0, &options));
        })
    });
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
