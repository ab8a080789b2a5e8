//! Randomized invariant sweep for the pricing engine
//!
//! Checks, over many random market snapshots evaluated in parallel:
//! 1. **Round trip**: buying then selling the same amount nets to zero
//! 2. **Chance bounds**: under the engine's configured estimator, both sides'
//!    chances lie in [0, 1] and sum to ~1
//! 3. **Quote policy**: tax is non-negative, priced quotes never exceed the budget,
//!    and buying a side never lowers its chance

use rand::prelude::*;
use rayon::prelude::*;
use std::env;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::PricingResult;
use crate::lmsr_core::{MarketState, Side, TradeRequest};
use crate::quote::{Budget, QuoteEngine, QuoteOutcome};

// Defaults; override via STRESS_* env vars
const SAMPLES: usize = 1_000_000;
const SEED: u64 = 0x5eed;
const MIN_LIQUIDITY: f64 = 10.0;
const MAX_LIQUIDITY: f64 = 10_000.0;
const MAX_SHARES: f64 = 10_000.0;
const MAX_AMOUNT: f64 = 1_000.0;

const ROUND_TRIP_TOLERANCE: f64 = 1e-6;
const CHANCE_RESIDUAL_TOLERANCE: f64 = 1e-3;
const CHANCE_MONOTONE_TOLERANCE: f64 = 1e-9;
const MAX_REPORTED_VIOLATIONS: usize = 20;

#[derive(Debug, Clone)]
pub struct StressConfig {
    pub samples: usize,
    pub seed: u64,
    pub min_liquidity: f64,
    pub max_liquidity: f64,
    pub max_shares: f64,
    pub max_amount: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            samples: SAMPLES,
            seed: SEED,
            min_liquidity: MIN_LIQUIDITY,
            max_liquidity: MAX_LIQUIDITY,
            max_shares: MAX_SHARES,
            max_amount: MAX_AMOUNT,
        }
    }
}

impl StressConfig {
    pub fn from_env() -> Self {
        let min_liquidity = env_f64_min("STRESS_MIN_LIQUIDITY", MIN_LIQUIDITY, 1.0);
        Self {
            samples: env_usize("STRESS_SAMPLES", SAMPLES),
            seed: env::var("STRESS_SEED")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(SEED),
            min_liquidity,
            max_liquidity: env_f64_min("STRESS_MAX_LIQUIDITY", MAX_LIQUIDITY, min_liquidity),
            max_shares: env_f64_min("STRESS_MAX_SHARES", MAX_SHARES, 0.0),
            max_amount: env_f64_min("STRESS_MAX_AMOUNT", MAX_AMOUNT, 0.0),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn env_f64_min(name: &str, default: f64, min: f64) -> f64 {
    env_f64(name, default).max(min)
}

/// Aggregated results of a sweep.
#[derive(Debug, Clone, Default)]
pub struct StressReport {
    pub samples: usize,
    pub priced: usize,
    pub rejected: usize,
    pub max_round_trip_drift: f64,
    pub max_chance_residual: f64,
    pub violation_count: usize,
    pub violations: Vec<String>,
}

impl StressReport {
    pub fn is_clean(&self) -> bool {
        self.violation_count == 0
    }

    fn merge(mut self, other: StressReport) -> StressReport {
        self.samples += other.samples;
        self.priced += other.priced;
        self.rejected += other.rejected;
        self.max_round_trip_drift = self.max_round_trip_drift.max(other.max_round_trip_drift);
        self.max_chance_residual = self.max_chance_residual.max(other.max_chance_residual);
        self.violation_count += other.violation_count;
        let room = MAX_REPORTED_VIOLATIONS.saturating_sub(self.violations.len());
        self.violations.extend(other.violations.into_iter().take(room));
        self
    }

    fn violation(&mut self, message: String) {
        self.violation_count += 1;
        if self.violations.len() < MAX_REPORTED_VIOLATIONS {
            self.violations.push(message);
        }
    }
}

/// Run the sweep on the rayon pool. Deterministic for a given seed.
pub fn run_stress_test(engine: &QuoteEngine, config: &StressConfig) -> StressReport {
    let start = Instant::now();
    info!(samples = config.samples, seed = config.seed, "starting pricing stress sweep");

    let report = (0..config.samples)
        .into_par_iter()
        .map(|index| check_sample(engine, config, index))
        .reduce(StressReport::default, StressReport::merge);

    let elapsed = start.elapsed();
    info!(
        samples = report.samples,
        priced = report.priced,
        rejected = report.rejected,
        max_round_trip_drift = report.max_round_trip_drift,
        max_chance_residual = report.max_chance_residual,
        violations = report.violation_count,
        elapsed_ms = elapsed.as_millis() as u64,
        "stress sweep finished"
    );
    for violation in &report.violations {
        warn!("{}", violation);
    }
    report
}

fn check_sample(engine: &QuoteEngine, config: &StressConfig, index: usize) -> StressReport {
    let mut rng = StdRng::seed_from_u64(config.seed ^ (index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    let mut report = StressReport {
        samples: 1,
        ..StressReport::default()
    };

    let b = if config.max_liquidity > config.min_liquidity {
        rng.gen_range(config.min_liquidity..config.max_liquidity)
    } else {
        config.min_liquidity
    };
    let yes = rng.gen::<f64>() * config.max_shares;
    let no = rng.gen::<f64>() * config.max_shares;
    let side = if rng.gen_bool(0.5) { Side::Yes } else { Side::No };
    let amount = rng.gen::<f64>() * config.max_amount;
    let budget = rng.gen_bool(0.5).then(|| rng.gen::<f64>() * config.max_amount);

    if let Err(e) = check_invariants(engine, &mut report, b, yes, no, side, amount, budget) {
        report.violation(format!("sample {index}: unexpected error {e} (b={b}, yes={yes}, no={no})"));
    }
    report
}

#[allow(clippy::too_many_arguments)]
fn check_invariants(
    engine: &QuoteEngine,
    report: &mut StressReport,
    b: f64,
    yes: f64,
    no: f64,
    side: Side,
    amount: f64,
    budget: Option<f64>,
) -> PricingResult<()> {
    let state = MarketState::new(b, yes, no)?;

    let paid = state.trade_cost(side, amount)?;
    let refunded = state.after(side, amount).trade_cost(side, -amount)?;
    let drift = (paid + refunded).abs();
    report.max_round_trip_drift = report.max_round_trip_drift.max(drift);
    if drift > ROUND_TRIP_TOLERANCE {
        report.violation(format!("round trip drift {drift} (b={b}, yes={yes}, no={no}, amount={amount})"));
    }

    let chance_yes = engine.chance(&state, Side::Yes)?;
    let chance_no = engine.chance(&state, Side::No)?;
    if !(0.0..=1.0).contains(&chance_yes) || !(0.0..=1.0).contains(&chance_no) {
        report.violation(format!("chance out of bounds yes={chance_yes} no={chance_no} (b={b})"));
    }
    let residual = (chance_yes + chance_no - 1.0).abs();
    report.max_chance_residual = report.max_chance_residual.max(residual);
    if residual > CHANCE_RESIDUAL_TOLERANCE {
        report.violation(format!("chance residual {residual} (b={b}, yes={yes}, no={no})"));
    }

    match engine.quote(&state, TradeRequest::buy(side, amount), budget.map(Budget::new))? {
        QuoteOutcome::Priced(quote) => {
            report.priced += 1;
            if quote.tax < 0.0 {
                report.violation(format!("negative tax {}", quote.tax));
            }
            if let Some(available) = budget {
                if quote.cost > available {
                    report.violation(format!("priced {} above budget {available}", quote.cost));
                }
            }
            let before = match side {
                Side::Yes => chance_yes,
                Side::No => chance_no,
            };
            if quote.implied_chance_after < before - CHANCE_MONOTONE_TOLERANCE {
                report.violation(format!(
                    "buying {side} moved its chance down {before} -> {} (b={b}, yes={yes}, no={no})",
                    quote.implied_chance_after
                ));
            }
        }
        QuoteOutcome::Rejected { .. } => {
            report.rejected += 1;
            if budget.map_or(true, |available| paid <= available) {
                report.violation(format!("rejected affordable trade costing {paid}"));
            }
        }
    }

    Ok(())
}
