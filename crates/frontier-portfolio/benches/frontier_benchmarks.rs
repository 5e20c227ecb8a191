//! Benchmarks for the frontier-portfolio optimization pipeline.
//!
//! Run with: cargo bench -p frontier-portfolio

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use frontier_portfolio::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

/// One-factor universe with `n` assets; positive definite for any `n`.
fn create_test_universe(n: usize) -> AssetUniverse {
    let assets = (0..n)
        .map(|i| {
            let beta = 0.2 + (i % 13) as f64 * 0.1;
            Asset::new(format!("FUND_{i:03}"), 0.02 + 0.05 * beta)
        })
        .collect::<Vec<_>>();
    let betas: Vec<f64> = (0..n).map(|i| 0.2 + (i % 13) as f64 * 0.1).collect();

    let covariance = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let systematic = betas[i] * betas[j] * 0.02;
                    if i == j {
                        systematic + 0.0025 + (i % 7) as f64 * 0.001
                    } else {
                        systematic
                    }
                })
                .collect()
        })
        .collect();

    AssetUniverse::new(assets, covariance).unwrap()
}

// =============================================================================
// SINGLE OPTIMIZATION
// =============================================================================

fn bench_min_variance(c: &mut Criterion) {
    let universe = AssetUniverse::sample_funds();
    let config = EngineConfig::default();
    let optimizer = PortfolioOptimizer::new(&universe, &config);

    c.bench_function("min_variance_sample_funds", |b| {
        b.iter(|| optimizer.optimize(black_box(OptimizationTarget::MinVariance)))
    });
}

fn bench_target_return_by_solver(c: &mut Criterion) {
    let universe = AssetUniverse::sample_funds();
    let target = OptimizationTarget::Return(0.11);

    let mut group = c.benchmark_group("target_return_solver");
    for kind in [SolverKind::ActiveSet, SolverKind::ProjectedGradient] {
        let config = EngineConfig::default().with_solver(kind);
        let optimizer = PortfolioOptimizer::new(&universe, &config);
        group.bench_function(optimizer.solver_name(), |b| {
            b.iter(|| optimizer.optimize(black_box(target)))
        });
    }
    group.finish();
}

fn bench_target_risk(c: &mut Criterion) {
    let universe = AssetUniverse::sample_funds();
    let config = EngineConfig::default();
    let optimizer = PortfolioOptimizer::new(&universe, &config);

    c.bench_function("target_risk_sample_funds", |b| {
        b.iter(|| optimizer.optimize(black_box(OptimizationTarget::Risk(0.15))))
    });
}

// =============================================================================
// FRONTIER
// =============================================================================

fn bench_frontier_points(c: &mut Criterion) {
    let universe = AssetUniverse::sample_funds();
    let config = EngineConfig::default();
    let builder = FrontierBuilder::new(&universe, &config);

    let mut group = c.benchmark_group("frontier_points");
    group.sample_size(20);

    for points in [10, 50, 100].iter() {
        group.throughput(Throughput::Elements(*points as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), points, |b, &points| {
            b.iter(|| builder.build(black_box(points)))
        });
    }
    group.finish();
}

fn bench_frontier_universe_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontier_universe_size");
    group.sample_size(10);

    for size in [5, 20, 50].iter() {
        let universe = create_test_universe(*size);
        let config = EngineConfig::default();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &universe, |b, universe| {
            b.iter(|| FrontierBuilder::new(black_box(universe), &config).build(50))
        });
    }
    group.finish();
}

fn bench_frontier_parallel_comparison(c: &mut Criterion) {
    let universe = AssetUniverse::sample_funds();
    let sequential = EngineConfig::default().with_parallel(false);
    let parallel = EngineConfig::default().with_parallel(true);

    let mut group = c.benchmark_group("frontier_comparison_100");
    group.sample_size(20);
    group.throughput(Throughput::Elements(100));

    group.bench_function("sequential", |b| {
        b.iter(|| FrontierBuilder::new(&universe, &sequential).build(black_box(100)))
    });

    group.bench_function("parallel", |b| {
        b.iter(|| FrontierBuilder::new(&universe, &parallel).build(black_box(100)))
    });

    group.finish();
}

// =============================================================================
// FULL PIPELINE
// =============================================================================

fn bench_recommend(c: &mut Criterion) {
    let advisor = Advisor::new(AssetUniverse::sample_funds(), EngineConfig::default()).unwrap();
    let frontier = advisor.frontier();
    let score = RiskScore::new(6.0).unwrap();

    c.bench_function("recommend_from_prebuilt_frontier", |b| {
        b.iter(|| advisor.recommend_from(black_box(score), black_box(100_000.0), &frontier))
    });
}

criterion_group!(
    benches,
    bench_min_variance,
    bench_target_return_by_solver,
    bench_target_risk,
    bench_frontier_points,
    bench_frontier_universe_size,
    bench_frontier_parallel_comparison,
    bench_recommend,
);
criterion_main!(benches);
