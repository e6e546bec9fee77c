//! Base-vs-incentive yield decomposition, sustainability scoring and risk
//! classification.

use serde::{Deserialize, Serialize};

use crate::domain::buckets::{classify, Category};
use crate::domain::model::Pool;

/// Raw APY above this is treated as a data anomaly and clamped.
const APY_ANOMALY_THRESHOLD: f64 = 1000.0;
const APY_CLAMP: f64 = 100.0;
/// Tolerance before base+incentive get rescaled to the total.
const DECOMPOSITION_TOLERANCE: f64 = 1.10;

const TOP_INCENTIVE_POOLS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SustainabilityRating {
    VeryLow,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Extreme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sustainability {
    pub score: f64,
    pub rating: SustainabilityRating,
    /// Applied adjustments, in order.
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolIncentives {
    pub project: String,
    pub symbol: String,
    pub category: Category,
    pub total_apy: f64,
    pub base_apy: f64,
    pub incentive_apy: f64,
    /// incentive share of total APY, percent, clamped to [0, 100].
    pub incentive_ratio: f64,
    pub has_explicit_breakdown: bool,
    pub apy_anomaly: bool,
    pub sustainability: Sustainability,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveAverages {
    pub base_apy: f64,
    pub incentive_apy: f64,
    pub incentive_ratio: f64,
}

/// Aggregate view across all analyzed pools. Both unweighted and
/// TVL-weighted averages are reported: long tails of tiny extreme-APY pools
/// skew the simple mean far above the weighted one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveOverview {
    pub pool_count: usize,
    pub anomaly_count: usize,
    pub simple: IncentiveAverages,
    pub tvl_weighted: IncentiveAverages,
    pub top_incentive_pools: Vec<PoolIncentives>,
}

/// Decompose one pool's APY and score it. Pure.
pub fn analyze_pool(pool: &Pool) -> PoolIncentives {
    let category = classify(pool);
    let apy_anomaly = pool.apy > APY_ANOMALY_THRESHOLD;
    let total_apy = if apy_anomaly { APY_CLAMP } else { pool.apy.max(0.0) };

    let has_explicit_breakdown = pool.has_explicit_breakdown();
    let (mut base_apy, mut incentive_apy) = if has_explicit_breakdown {
        (pool.apy_base.max(0.0), pool.apy_reward.max(0.0))
    } else {
        estimate_split(category, total_apy)
    };

    // Rescale proportionally when the components overshoot the total.
    let sum = base_apy + incentive_apy;
    if sum > total_apy * DECOMPOSITION_TOLERANCE && sum > 0.0 {
        let scale = total_apy / sum;
        base_apy *= scale;
        incentive_apy *= scale;
    }

    let incentive_ratio = if total_apy > 0.0 {
        (incentive_apy / total_apy * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    PoolIncentives {
        project: pool.project.clone(),
        symbol: pool.symbol.clone(),
        category,
        total_apy,
        base_apy,
        incentive_apy,
        incentive_ratio,
        has_explicit_breakdown,
        apy_anomaly,
        sustainability: score_sustainability(category, incentive_ratio, pool.tvl_usd, total_apy),
        risk_level: classify_risk(total_apy, incentive_ratio),
    }
}

/// Protocol-family heuristics for pools with no explicit breakdown.
/// Returns (base, incentive).
fn estimate_split(category: Category, total_apy: f64) -> (f64, f64) {
    let base_share = match category {
        // Lending yield is mostly organic interest unless the figure is
        // unusually high for a money market.
        Category::Lending => {
            if total_apy > 15.0 {
                0.5
            } else {
                0.8
            }
        }
        // Auto-compounders mostly recycle reward emissions.
        Category::AutoCompound => 0.3,
        // DEX yield is trading-fee-like at moderate levels, emission-driven
        // beyond that.
        Category::Dex => {
            if total_apy > 20.0 {
                0.4
            } else {
                0.7
            }
        }
        _ => {
            if total_apy > 50.0 {
                0.2
            } else if total_apy > 25.0 {
                0.35
            } else {
                0.6
            }
        }
    };
    (total_apy * base_share, total_apy * (1.0 - base_share))
}

fn score_sustainability(
    category: Category,
    incentive_ratio: f64,
    tvl_usd: f64,
    total_apy: f64,
) -> Sustainability {
    let mut score: f64 = 100.0;
    let mut factors = Vec::new();
    fn apply(delta: f64, reason: &str, score: &mut f64, factors: &mut Vec<String>) {
        *score += delta;
        factors.push(format!("{} ({:+})", reason, delta));
    }

    match category {
        Category::Lending => {
            if incentive_ratio > 50.0 {
                apply(-20.0, "incentive-heavy for a lending market", &mut score, &mut factors);
            }
        }
        Category::AutoCompound => {
            if incentive_ratio > 80.0 {
                apply(-15.0, "almost entirely emission-driven", &mut score, &mut factors);
            }
        }
        _ => {
            if incentive_ratio > 70.0 {
                apply(-30.0, "yield dominated by incentives", &mut score, &mut factors);
            } else if incentive_ratio > 50.0 {
                apply(-15.0, "majority of yield from incentives", &mut score, &mut factors);
            }
        }
    }

    if tvl_usd >= 10_000_000.0 {
        apply(10.0, "large TVL above $10M", &mut score, &mut factors);
    } else if tvl_usd >= 1_000_000.0 {
        apply(5.0, "TVL above $1M", &mut score, &mut factors);
    } else if tvl_usd < 100_000.0 {
        apply(-20.0, "TVL below $100k", &mut score, &mut factors);
    }

    if total_apy > 100.0 {
        apply(-40.0, "extreme APY above 100%", &mut score, &mut factors);
    } else if total_apy > 50.0 {
        if category == Category::AutoCompound {
            apply(-10.0, "high APY for a compounder", &mut score, &mut factors);
        } else {
            apply(-25.0, "APY above 50%", &mut score, &mut factors);
        }
    } else if total_apy > 25.0 {
        apply(-10.0, "APY above 25%", &mut score, &mut factors);
    }

    let score = score.clamp(0.0, 100.0);
    let rating = if score >= 75.0 {
        SustainabilityRating::High
    } else if score >= 55.0 {
        SustainabilityRating::Medium
    } else if score >= 35.0 {
        SustainabilityRating::Low
    } else {
        SustainabilityRating::VeryLow
    };

    Sustainability {
        score,
        rating,
        factors,
    }
}

fn classify_risk(total_apy: f64, incentive_ratio: f64) -> RiskLevel {
    if total_apy > 100.0 || incentive_ratio > 90.0 {
        RiskLevel::Extreme
    } else if total_apy > 50.0 || incentive_ratio > 75.0 {
        RiskLevel::High
    } else if total_apy > 25.0 || incentive_ratio > 50.0 {
        RiskLevel::Medium
    } else if total_apy > 10.0 || incentive_ratio > 25.0 {
        RiskLevel::Low
    } else {
        RiskLevel::Minimal
    }
}

/// Decompose every pool and roll the results up. Pure.
pub fn analyze(pools: &[Pool]) -> IncentiveOverview {
    let breakdowns: Vec<PoolIncentives> = pools.iter().map(analyze_pool).collect();
    let count = breakdowns.len();
    if count == 0 {
        return IncentiveOverview::default();
    }

    let simple = IncentiveAverages {
        base_apy: crate::math::simple_average(breakdowns.iter().map(|b| b.base_apy)),
        incentive_apy: crate::math::simple_average(breakdowns.iter().map(|b| b.incentive_apy)),
        incentive_ratio: crate::math::simple_average(breakdowns.iter().map(|b| b.incentive_ratio)),
    };

    let total_tvl: f64 = pools.iter().map(|p| p.tvl_usd.max(0.0)).sum();
    let tvl_weighted = if total_tvl > 0.0 {
        let weighted = |f: fn(&PoolIncentives) -> f64| -> f64 {
            breakdowns
                .iter()
                .zip(pools)
                .map(|(b, p)| f(b) * p.tvl_usd.max(0.0))
                .sum::<f64>()
                / total_tvl
        };
        IncentiveAverages {
            base_apy: weighted(|b| b.base_apy),
            incentive_apy: weighted(|b| b.incentive_apy),
            incentive_ratio: weighted(|b| b.incentive_ratio),
        }
    } else {
        IncentiveAverages::default()
    };

    let anomaly_count = breakdowns.iter().filter(|b| b.apy_anomaly).count();

    let mut top = breakdowns;
    top.sort_by(|a, b| {
        b.incentive_apy
            .partial_cmp(&a.incentive_apy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top.truncate(TOP_INCENTIVE_POOLS);

    IncentiveOverview {
        pool_count: count,
        anomaly_count,
        simple,
        tvl_weighted,
        top_incentive_pools: top,
    }
}
