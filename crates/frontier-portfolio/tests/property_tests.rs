//! Property-based tests for optimizer and mapping invariants.
//!
//! These tests verify properties that should always hold:
//! - Optimized weights are long-only and fully invested
//! - Successful frontier points hit their target return
//! - Risk mapping is monotone in the score
//! - Cleaned weights and allocation plans are consistent

use frontier_portfolio::optimizer::{RETURN_TOLERANCE, SUM_TOLERANCE};
use frontier_portfolio::prelude::*;
use proptest::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

/// Generates a universe with `n` assets from a one-factor model.
///
/// `Σ = β βᵀ σ_m² + diag(idio²)` is positive definite, so every generated
/// universe is a valid optimization input.
fn generate_universe(n: usize, seed: u64) -> AssetUniverse {
    let market_variance = 0.02;
    let mut assets = Vec::with_capacity(n);
    let mut betas = Vec::with_capacity(n);
    let mut idio = Vec::with_capacity(n);

    for i in 0..n {
        let hash = simple_hash(seed, i as u64);
        let beta = 0.1 + (hash % 140) as f64 / 100.0; // 0.1-1.5
        let specific = 0.02 + (hash % 180) as f64 / 1000.0; // 2-20%
        let expected_return = 0.01 + 0.06 * beta + (hash % 30) as f64 / 1000.0;

        assets.push(Asset::new(format!("Asset {i}"), expected_return));
        betas.push(beta);
        idio.push(specific);
    }

    let covariance = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let systematic = betas[i] * betas[j] * market_variance;
                    if i == j {
                        systematic + idio[i] * idio[i]
                    } else {
                        systematic
                    }
                })
                .collect()
        })
        .collect();

    AssetUniverse::new(assets, covariance).unwrap()
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(seed: u64, i: u64) -> u64 {
    let mut x = seed.wrapping_add(i).wrapping_mul(0x517c_c1b7_2722_0a95);
    x ^= x >> 32;
    x = x.wrapping_mul(0x517c_c1b7_2722_0a95);
    x ^= x >> 32;
    x
}

fn assert_long_only(weights: &[f64]) {
    let sum: f64 = weights.iter().sum();
    assert!((sum - 1.0).abs() <= SUM_TOLERANCE, "sum = {sum}");
    assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)), "{weights:?}");
}

// =============================================================================
// PROPERTY: OPTIMIZED WEIGHTS ARE LONG-ONLY AND FULLY INVESTED
// =============================================================================

#[test]
fn test_min_variance_weights_valid() {
    let config = EngineConfig::default();
    for seed in 0..20 {
        let n = 2 + (seed as usize % 12);
        let universe = generate_universe(n, seed);
        let outcome = PortfolioOptimizer::new(&universe, &config)
            .optimize(OptimizationTarget::MinVariance)
            .unwrap();

        assert!(outcome.success, "seed {seed}: {}", outcome.message);
        assert_long_only(&outcome.weights);
    }
}

#[test]
fn test_target_return_weights_valid() {
    let config = EngineConfig::default();
    for seed in 0..20 {
        let universe = generate_universe(8, seed);
        let optimizer = PortfolioOptimizer::new(&universe, &config);
        let (low, high) = (universe.min_return(), universe.max_return());

        for k in 0..5 {
            let target = low + (high - low) * (f64::from(k) + 0.5) / 5.0;
            let outcome = optimizer.optimize(OptimizationTarget::Return(target)).unwrap();
            assert!(outcome.success, "seed {seed}, target {target}: {}", outcome.message);
            assert_long_only(&outcome.weights);
            assert!((outcome.metrics.expected_return - target).abs() <= RETURN_TOLERANCE);
        }
    }
}

// =============================================================================
// PROPERTY: FRONTIER POINTS HIT THEIR TARGETS
// =============================================================================

#[test]
fn test_frontier_targets_met() {
    let config = EngineConfig::default();
    for seed in 0..10 {
        let universe = generate_universe(6, seed);
        let frontier = FrontierBuilder::new(&universe, &config).build(20);

        assert_eq!(frontier.len() + frontier.skipped, 20);
        for point in &frontier {
            assert_long_only(&point.weights);
            assert!((point.metrics.expected_return - point.target_return).abs() <= RETURN_TOLERANCE);
        }
    }
}

#[test]
fn test_frontier_volatility_non_decreasing() {
    let config = EngineConfig::default();
    for seed in 0..10 {
        let universe = generate_universe(7, seed);
        let frontier = FrontierBuilder::new(&universe, &config).build(25);

        for pair in frontier.points.windows(2) {
            assert!(
                pair[1].metrics.volatility >= pair[0].metrics.volatility - 1e-9,
                "seed {seed}: {} then {}",
                pair[0].metrics.volatility,
                pair[1].metrics.volatility
            );
        }
    }
}

// =============================================================================
// PROPERTY: RISK MAPPING IS MONOTONE
// =============================================================================

#[test]
fn test_selected_return_increases_with_score() {
    let universe = generate_universe(9, 42);
    let config = EngineConfig::default();
    let frontier = FrontierBuilder::new(&universe, &config).build(40);
    let mapper = RiskMapper::new(&universe, &config);

    let mut previous = f64::NEG_INFINITY;
    for step in 0..=18 {
        let score = RiskScore::new(1.0 + f64::from(step) * 0.5).unwrap();
        let selected = mapper.select(score, &frontier).unwrap();
        assert!(selected.metrics.expected_return >= previous);
        previous = selected.metrics.expected_return;
    }
}

proptest! {
    #[test]
    fn prop_frontier_index_monotone(a in 1.0f64..=10.0, b in 1.0f64..=10.0, len in 1usize..500) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo_index = frontier_index(RiskScore::new(lo).unwrap(), len).unwrap();
        let hi_index = frontier_index(RiskScore::new(hi).unwrap(), len).unwrap();
        prop_assert!(lo_index <= hi_index);
        prop_assert!(hi_index < len);
    }

    #[test]
    fn prop_out_of_range_scores_rejected(score in prop_oneof![-100.0f64..0.999, 10.001f64..100.0]) {
        prop_assert!(RiskScore::new(score).is_err());
        let clamped = RiskScore::clamped(score).unwrap().value();
        prop_assert!((1.0..=10.0).contains(&clamped));
    }

    #[test]
    fn prop_clean_weights_sum_to_one(raw in prop::collection::vec(0.0f64..1.0, 1..20)) {
        let total: f64 = raw.iter().sum();
        prop_assume!(total > 1e-6);
        let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();

        let cleaned = clean_weights(&weights, 0.001);
        let sum: f64 = cleaned.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-12);
        // Normalized weights always keep at least one entry above 0.001.
        for (before, after) in weights.iter().zip(&cleaned) {
            if *before < 0.001 {
                prop_assert_eq!(*after, 0.0);
            } else {
                prop_assert!(*after >= *before * (1.0 - 1e-12));
            }
        }
    }

    #[test]
    fn prop_metrics_scale(scale in 0.1f64..5.0, seed in 0u64..1000) {
        let universe = generate_universe(5, seed);
        let weights = universe.equal_weights();
        let scaled: Vec<f64> = weights.iter().map(|w| w * scale).collect();

        let base = portfolio_metrics(&universe, &weights, 2.5).unwrap();
        let big = portfolio_metrics(&universe, &scaled, 2.5).unwrap();
        prop_assert!((big.expected_return - scale * base.expected_return).abs() < 1e-12);
        prop_assert!((big.volatility - scale * base.volatility).abs() < 1e-12);
    }

    #[test]
    fn prop_plan_amounts_consistent(
        raw in prop::collection::vec(0.0f64..1.0, 10),
        amount in 1.0f64..10_000_000.0,
    ) {
        let total: f64 = raw.iter().sum();
        prop_assume!(total > 1e-3);
        let universe = AssetUniverse::sample_funds();
        let weights = clean_weights(&raw.iter().map(|w| w / total).collect::<Vec<_>>(), 0.001);
        let selected = SelectedPortfolio {
            metrics: portfolio_metrics(&universe, &weights, 2.5).unwrap(),
            weights,
            risk_score: RiskScore::new(5.0).unwrap(),
            frontier_index: Some(0),
            fallback: false,
        };

        let plan = AllocationPlan::build(&universe, &selected, amount, 0.001).unwrap();
        for pair in plan.entries.windows(2) {
            prop_assert!(pair[0].weight >= pair[1].weight);
        }
        for entry in &plan.entries {
            prop_assert!(entry.weight > 0.001);
            prop_assert!((entry.amount - entry.weight * amount).abs() <= 1e-9 * amount);
        }
        let omitted: f64 = selected.weights.iter().filter(|&&w| w <= 0.001).sum();
        prop_assert!((plan.allocated_amount() - (1.0 - omitted) * amount).abs() <= 1e-6 * amount);
    }
}
