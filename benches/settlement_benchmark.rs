use criterion::{black_box, criterion_group, criterion_main, Criterion};
use debt_simplifier::core::balance::{aggregate_transactions, BalanceMap, Tolerance};
use debt_simplifier::core::transaction::ShareRounding;
use debt_simplifier::optimization::exact::ExactSolver;
use debt_simplifier::optimization::greedy::greedy_settle;
use debt_simplifier::simulation::stress_test::{generate_transactions, ExpenseConfig};

fn balances_for(party_count: usize, transaction_count: usize) -> BalanceMap {
    let config = ExpenseConfig {
        party_count,
        transaction_count,
        seed: Some(17),
        ..Default::default()
    };
    aggregate_transactions(
        &generate_transactions(&config),
        ShareRounding::NearestUnit,
        Tolerance::DEFAULT,
    )
    .unwrap_or_default()
}

fn bench_exact_8_parties(c: &mut Criterion) {
    let balances = balances_for(8, 20);
    let solver = ExactSolver::new(Tolerance::DEFAULT);

    c.bench_function("exact_8_parties", |b| {
        b.iter(|| solver.solve(black_box(&balances)))
    });
}

fn bench_exact_vs_greedy_10_parties(c: &mut Criterion) {
    let balances = balances_for(10, 30);
    let solver = ExactSolver::new(Tolerance::DEFAULT);

    let mut group = c.benchmark_group("10_parties");
    group.sample_size(10);
    group.bench_function("exact", |b| b.iter(|| solver.solve(black_box(&balances))));
    group.bench_function("greedy", |b| {
        b.iter(|| greedy_settle(black_box(&balances), Tolerance::DEFAULT))
    });
    group.finish();
}

fn bench_greedy_1000_parties(c: &mut Criterion) {
    let balances = balances_for(1000, 5000);

    c.bench_function("greedy_1000_parties", |b| {
        b.iter(|| greedy_settle(black_box(&balances), Tolerance::DEFAULT))
    });
}

criterion_group!(
    benches,
    bench_exact_8_parties,
    bench_exact_vs_greedy_10_parties,
    bench_greedy_1000_parties
);
criterion_main!(benches);
