//! Synthetic strategy estimates derived from already-fetched snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::model::{ProtocolSnapshot, Source, SourcePayload};
use crate::math::{apply_fee_discount, calculate_leveraged_apy};

/// Leverage used for the loop estimate, capped by what the fetched LTV
/// actually supports.
const MAX_LOOP_LEVERAGE: f64 = 5.0;

const BEEFY_NET_FACTOR: f64 = 0.995;
const EULER_NET_FACTOR: f64 = 0.95;
const YAK_NET_FACTOR: f64 = 0.98;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub strategy: String,
    pub apy: f64,
    pub net_apy: f64,
    pub risk_level: String,
    pub source: String,
}

/// Build the strategy table. A strategy appears only when its underlying
/// source succeeded; nothing is fabricated for missing sources.
pub fn estimate(protocols: &BTreeMap<Source, ProtocolSnapshot>) -> BTreeMap<String, Strategy> {
    let mut strategies = BTreeMap::new();

    let payload = |source: Source| -> Option<&SourcePayload> {
        protocols.get(&source).and_then(|s| s.payload.as_ref())
    };

    if let Some(SourcePayload::Aave(market)) = payload(Source::Aave) {
        let leverage = market.rates.safe_max_leverage.min(MAX_LOOP_LEVERAGE).max(1.0);
        let apy = calculate_leveraged_apy(
            market.rates.supply_apy,
            market.rates.borrow_apy,
            leverage,
        );
        strategies.insert(
            "leveraged".to_string(),
            Strategy {
                strategy: "Leveraged Looping".to_string(),
                apy,
                net_apy: apy,
                risk_level: "High".to_string(),
                source: Source::Aave.name().to_string(),
            },
        );
    }

    if let Some(SourcePayload::Beefy(vaults)) = payload(Source::Beefy) {
        if let Some(best) = vaults.vaults.first() {
            strategies.insert(
                "autoCompound".to_string(),
                Strategy {
                    strategy: "Auto-Compound".to_string(),
                    apy: best.apy,
                    net_apy: apply_fee_discount(best.apy, BEEFY_NET_FACTOR),
                    risk_level: "Medium".to_string(),
                    source: Source::Beefy.name().to_string(),
                },
            );
        }
    }

    if let Some(SourcePayload::Euler(overview)) = payload(Source::Euler) {
        if let Some(best) = overview.pools.first() {
            strategies.insert(
                "eulerVault".to_string(),
                Strategy {
                    strategy: "Euler V2 Vault".to_string(),
                    apy: best.apy,
                    net_apy: apply_fee_discount(best.apy, EULER_NET_FACTOR),
                    risk_level: "Medium".to_string(),
                    source: Source::Euler.name().to_string(),
                },
            );
        }
    }

    if let Some(SourcePayload::YieldYak(farms)) = payload(Source::YieldYak) {
        let best = farms
            .farms
            .iter()
            .max_by(|a, b| a.apy.partial_cmp(&b.apy).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(best) = best {
            strategies.insert(
                "yieldYakFarm".to_string(),
                Strategy {
                    strategy: "Yield Yak Auto-Compound".to_string(),
                    apy: best.apy,
                    net_apy: apply_fee_discount(best.apy, YAK_NET_FACTOR),
                    risk_level: "Medium".to_string(),
                    source: Source::YieldYak.name().to_string(),
                },
            );
        }
    }

    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AaveMarket, FarmSet, LendingRates, Pool, RiskLabel, RiskMetrics, SourceSummary, VaultSet,
    };

    fn aave_snapshot(supply: f64, borrow: f64, safe_leverage: f64) -> ProtocolSnapshot {
        ProtocolSnapshot::ok(
            Source::Aave,
            SourcePayload::Aave(AaveMarket {
                rates: LendingRates {
                    supply_apy: supply,
                    borrow_apy: borrow,
                    utilization_pct: 70.0,
                    total_liquidity_usd: 5_000_000.0,
                    total_debt_usd: 3_500_000.0,
                    ltv: 0.8,
                    liquidation_threshold: 0.85,
                    liquidation_bonus: 0.05,
                    max_leverage: 5.0,
                    safe_max_leverage: safe_leverage,
                },
                risk_metrics: RiskMetrics {
                    borrow_rate_spread: borrow - supply,
                    utilization_risk: RiskLabel::Medium,
                    liquidity_risk: RiskLabel::Low,
                },
                pool: Pool::default(),
            }),
        )
    }

    #[test]
    fn test_only_successful_sources_produce_strategies() {
        let mut protocols = BTreeMap::new();
        protocols.insert(Source::Aave, aave_snapshot(6.0, 7.0, 3.57));
        protocols.insert(
            Source::Beefy,
            ProtocolSnapshot::failed(Source::Beefy, "Beefy API failed: vaults=500"),
        );

        let strategies = estimate(&protocols);
        assert!(strategies.contains_key("leveraged"));
        assert!(!strategies.contains_key("autoCompound"));
        assert!(!strategies.contains_key("eulerVault"));
    }

    #[test]
    fn test_leveraged_loop_uses_capped_leverage() {
        let mut protocols = BTreeMap::new();
        // safe leverage past the cap: the 5x figure should be used
        protocols.insert(Source::Aave, aave_snapshot(6.0, 7.0, 9.9));
        let strategies = estimate(&protocols);
        let s = &strategies["leveraged"];
        // 6*5 - 7*4 - 0.5 = 1.5
        assert!((s.apy - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_best_vault_and_farm_selected() {
        let mut protocols = BTreeMap::new();
        protocols.insert(
            Source::Beefy,
            ProtocolSnapshot::ok(
                Source::Beefy,
                SourcePayload::Beefy(VaultSet {
                    summary: SourceSummary::default(),
                    vaults: vec![
                        Pool { apy: 22.0, ..Pool::default() },
                        Pool { apy: 11.0, ..Pool::default() },
                    ],
                }),
            ),
        );
        protocols.insert(
            Source::YieldYak,
            ProtocolSnapshot::ok(
                Source::YieldYak,
                SourcePayload::YieldYak(FarmSet {
                    summary: SourceSummary::default(),
                    farms: vec![
                        Pool { apy: 8.0, ..Pool::default() },
                        Pool { apy: 14.0, ..Pool::default() },
                    ],
                }),
            ),
        );

        let strategies = estimate(&protocols);
        assert!((strategies["autoCompound"].apy - 22.0).abs() < 1e-9);
        assert!((strategies["autoCompound"].net_apy - 22.0 * 0.995).abs() < 1e-9);
        // farms are TVL-ordered, the estimator still picks the best APY
        assert!((strategies["yieldYakFarm"].apy - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_yields_no_strategies() {
        assert!(estimate(&BTreeMap::new()).is_empty());
    }
}
