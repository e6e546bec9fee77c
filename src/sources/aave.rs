//! Aave V3 lending market adapter.
//!
//! Reads the yields index, picks the deepest pool for the target asset on
//! the target chain and derives LTV-based leverage and risk parameters.
//! Utilization arrives as a 0-1 fraction and is normalized to percent.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::domain::model::{
    AaveMarket, LendingRates, RiskLabel, RiskMetrics, Source, SourcePayload,
};
use crate::infrastructure::http::HttpApi;
use crate::shared::errors::FetchError;
use crate::shared::normalize::fraction_to_percent;
use crate::sources::llama::{parse_pools, sort_by_tvl_desc, LlamaPool, YIELDS_POOLS_URL};
use crate::sources::ProtocolAdapter;

const PROJECT: &str = "aave-v3";
const CALL: &str = "Aave yields";

// Defaults applied when the index omits the risk parameters.
const DEFAULT_LTV: f64 = 0.80;
const DEFAULT_LIQUIDATION_THRESHOLD: f64 = 0.85;
const DEFAULT_LIQUIDATION_BONUS: f64 = 0.05;

/// Safety margin on LTV for the "safe" leverage figure.
const SAFE_LTV_FACTOR: f64 = 0.9;

pub struct AaveAdapter {
    http: Arc<dyn HttpApi>,
    chain: String,
    asset: String,
}

impl AaveAdapter {
    pub fn new(config: &Config, http: Arc<dyn HttpApi>) -> Self {
        Self {
            http,
            chain: config.chain.name.clone(),
            asset: config.filters.asset_symbol.clone(),
        }
    }

    fn build_market(&self, best: &LlamaPool) -> AaveMarket {
        let supply_apy = best.apy();
        let borrow_apy = best.apy_base_borrow.unwrap_or(supply_apy * 1.2);
        let utilization = best.utilization.unwrap_or(0.0);
        let tvl = best.tvl_usd();

        let ltv = best.ltv.unwrap_or(DEFAULT_LTV);
        let liquidation_threshold = best
            .liquidation_threshold
            .unwrap_or(DEFAULT_LIQUIDATION_THRESHOLD);
        let liquidation_bonus = best.liquidation_bonus.unwrap_or(DEFAULT_LIQUIDATION_BONUS);

        let utilization_risk = if utilization > 0.8 {
            RiskLabel::High
        } else if utilization > 0.6 {
            RiskLabel::Medium
        } else {
            RiskLabel::Low
        };
        let liquidity_risk = if tvl < 1_000_000.0 {
            RiskLabel::High
        } else if tvl < 10_000_000.0 {
            RiskLabel::Medium
        } else {
            RiskLabel::Low
        };

        AaveMarket {
            rates: LendingRates {
                supply_apy,
                borrow_apy,
                utilization_pct: fraction_to_percent(utilization),
                total_liquidity_usd: tvl,
                total_debt_usd: tvl * utilization,
                ltv,
                liquidation_threshold,
                liquidation_bonus,
                max_leverage: 1.0 / (1.0 - ltv),
                safe_max_leverage: 1.0 / (1.0 - ltv * SAFE_LTV_FACTOR),
            },
            risk_metrics: RiskMetrics {
                borrow_rate_spread: borrow_apy - supply_apy,
                utilization_risk,
                liquidity_risk,
            },
            pool: best.to_pool(),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for AaveAdapter {
    fn source(&self) -> Source {
        Source::Aave
    }

    async fn fetch(&self) -> Result<SourcePayload, FetchError> {
        let raw = self.http.get_json(CALL, YIELDS_POOLS_URL).await?;
        let pools = parse_pools(CALL, &raw)?;

        let asset = self.asset.to_lowercase();
        let mut matches: Vec<LlamaPool> = pools
            .into_iter()
            .filter(|p| {
                p.project == PROJECT
                    && p.chain == self.chain
                    && p.symbol.to_lowercase().contains(&asset)
            })
            .collect();

        if matches.is_empty() {
            return Err(FetchError::no_data(format!(
                "no {} {} pools found on {}",
                PROJECT, self.asset, self.chain
            )));
        }

        sort_by_tvl_desc(&mut matches);
        let market = self.build_market(&matches[0]);
        info!(
            "✅ Aave {} market: supply {:.2}%, borrow {:.2}%, max leverage {:.2}x",
            self.asset, market.rates.supply_apy, market.rates.borrow_apy, market.rates.max_leverage
        );

        Ok(SourcePayload::Aave(market))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::tests_support::StaticApi;
    use serde_json::json;

    fn yields_fixture() -> serde_json::Value {
        json!({
            "data": [
                {"project": "aave-v3", "chain": "Avalanche", "symbol": "aAvaUSDC", "apy": 4.5,
                 "apyBaseBorrow": 6.0, "utilization": 0.72, "tvlUsd": 12_000_000.0},
                {"project": "aave-v3", "chain": "Avalanche", "symbol": "USDC", "apy": 3.0,
                 "tvlUsd": 2_000_000.0},
                {"project": "aave-v3", "chain": "Ethereum", "symbol": "USDC", "apy": 9.0,
                 "tvlUsd": 90_000_000.0},
                {"project": "euler-v2", "chain": "Avalanche", "symbol": "USDC", "apy": 5.0,
                 "tvlUsd": 1_000_000.0}
            ]
        })
    }

    #[tokio::test]
    async fn test_picks_deepest_matching_pool_and_derives_leverage() {
        let adapter = AaveAdapter::new(
            &Config::default(),
            Arc::new(StaticApi::ok(yields_fixture())),
        );
        let payload = adapter.fetch().await.unwrap();
        let market = match payload {
            SourcePayload::Aave(m) => m,
            _ => panic!("wrong payload"),
        };

        assert_eq!(market.pool.symbol, "aAvaUSDC");
        assert_eq!(market.rates.supply_apy, 4.5);
        assert_eq!(market.rates.borrow_apy, 6.0);
        assert!((market.rates.utilization_pct - 72.0).abs() < 1e-9);
        // default LTV 0.8 -> 5x max, 3.57x safe
        assert!((market.rates.max_leverage - 5.0).abs() < 1e-9);
        assert!((market.rates.safe_max_leverage - 1.0 / (1.0 - 0.72)).abs() < 1e-9);
        assert_eq!(market.risk_metrics.utilization_risk, RiskLabel::Medium);
        assert_eq!(market.risk_metrics.liquidity_risk, RiskLabel::Low);
    }

    #[tokio::test]
    async fn test_borrow_rate_fallback() {
        let adapter = AaveAdapter::new(
            &Config::default(),
            Arc::new(StaticApi::ok(json!({
                "data": [{"project": "aave-v3", "chain": "Avalanche", "symbol": "USDC",
                          "apy": 5.0, "tvlUsd": 500_000.0}]
            }))),
        );
        let payload = adapter.fetch().await.unwrap();
        let market = match payload {
            SourcePayload::Aave(m) => m,
            _ => panic!("wrong payload"),
        };
        assert!((market.rates.borrow_apy - 6.0).abs() < 1e-9);
        assert_eq!(market.risk_metrics.liquidity_risk, RiskLabel::High);
    }

    #[tokio::test]
    async fn test_no_matching_pools_is_a_domain_error() {
        let adapter = AaveAdapter::new(
            &Config::default(),
            Arc::new(StaticApi::ok(json!({"data": []}))),
        );
        let err = adapter.fetch().await.unwrap_err();
        assert!(err.to_string().contains("no aave-v3 USDC pools found on Avalanche"));
    }
}
