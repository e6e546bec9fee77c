// src/math.rs
use crate::domain::model::Pool;

/// Per-unit-leverage gas cost estimate, in APY percentage points.
const LEVERAGE_GAS_COST_PCT: f64 = 0.1;

/// Calculate the APY of a leveraged supply/borrow loop.
///
/// gross = supply * L - borrow * (L - 1), minus a fixed gas estimate per unit
/// of leverage. Floored at zero: a loop that loses money reports 0, not a
/// negative yield.
pub fn calculate_leveraged_apy(supply_apy: f64, borrow_apy: f64, leverage: f64) -> f64 {
    let gross = supply_apy * leverage - borrow_apy * (leverage - 1.0);
    let gas_costs = leverage * LEVERAGE_GAS_COST_PCT;
    (gross - gas_costs).max(0.0)
}

/// Apply a flat fee discount factor to a gross APY.
pub fn apply_fee_discount(apy: f64, net_factor: f64) -> f64 {
    (apy * net_factor).max(0.0)
}

/// TVL-weighted mean APY. Zero total TVL yields 0, never a division by zero.
pub fn weighted_average_apy(pools: &[Pool]) -> f64 {
    let total_tvl: f64 = pools.iter().map(|p| p.tvl_usd.max(0.0)).sum();
    if total_tvl <= 0.0 {
        return 0.0;
    }
    pools
        .iter()
        .map(|p| p.apy * p.tvl_usd.max(0.0))
        .sum::<f64>()
        / total_tvl
}

/// Unweighted mean of an iterator of values; empty input yields 0.
pub fn simple_average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
