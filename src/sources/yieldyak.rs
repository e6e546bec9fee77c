//! Yield Yak farm adapter.
//!
//! The farms endpoint reports most numeric fields as strings and the chain
//! id as either a string or a number, so everything goes through the
//! normalizer. The upstream carries no APY figure at all; it is estimated
//! from the reinvest reward rate or pending rewards and capped.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::domain::model::{FarmSet, Pool, Source, SourcePayload, SourceSummary};
use crate::infrastructure::http::HttpApi;
use crate::shared::errors::FetchError;
use crate::shared::normalize::coerce_scalar;
use crate::sources::ProtocolAdapter;

const FARMS_URL: &str = "https://staging-api.yieldyak.com/farms";
const CALL: &str = "Yield Yak farms";

/// Minimum deposits for a farm to count as active, in USD.
const MIN_DEPOSITS_USD: f64 = 1000.0;
/// Farms below this do not count toward the summary TVL.
const SIGNIFICANT_TVL_USD: f64 = 50_000.0;
/// Conservative default when no reward data supports an estimate.
const DEFAULT_APY: f64 = 5.0;
const APY_CAP: f64 = 50.0;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct YakFarm {
    chain_id: Value,
    total_deposits: Value,
    total_supply: Value,
    pending_rewards: Value,
    reinvest_reward_bips: Value,
    deposit_token: Option<YakToken>,
    platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YakToken {
    symbol: String,
}

pub struct YieldYakAdapter {
    http: Arc<dyn HttpApi>,
    chain_id: String,
    chain_name: String,
}

impl YieldYakAdapter {
    pub fn new(config: &Config, http: Arc<dyn HttpApi>) -> Self {
        Self {
            http,
            chain_id: config.chain.yak_chain_id.clone(),
            chain_name: config.chain.name.clone(),
        }
    }

    fn on_chain(&self, farm: &YakFarm) -> bool {
        match &farm.chain_id {
            Value::String(s) => s == &self.chain_id,
            Value::Number(n) => n.to_string() == self.chain_id,
            _ => false,
        }
    }

    /// Estimation ladder: reinvest reward rate annualized, then a one-day
    /// read of pending rewards, then a flat conservative default.
    fn estimate_apy(farm: &YakFarm, tvl: f64) -> f64 {
        let reinvest_bips = coerce_scalar(&farm.reinvest_reward_bips);
        if reinvest_bips > 0.0 {
            return ((reinvest_bips / 10_000.0) * 365.0).min(APY_CAP);
        }

        let pending = coerce_scalar(&farm.pending_rewards);
        if pending > 0.0 && tvl > 0.0 {
            return (pending / tvl * 365.0 * 100.0).min(APY_CAP);
        }

        DEFAULT_APY
    }
}

#[async_trait]
impl ProtocolAdapter for YieldYakAdapter {
    fn source(&self) -> Source {
        Source::YieldYak
    }

    async fn fetch(&self) -> Result<SourcePayload, FetchError> {
        let raw = self.http.get_json(CALL, FARMS_URL).await?;
        let farms: Vec<YakFarm> = raw
            .as_array()
            .ok_or_else(|| FetchError::malformed(CALL, "expected a farm array"))?
            .iter()
            .filter_map(|f| serde_json::from_value(f.clone()).ok())
            .collect();

        let mut pools: Vec<Pool> = farms
            .iter()
            .filter(|f| self.on_chain(f))
            .filter_map(|farm| {
                let tvl = coerce_scalar(&farm.total_deposits);
                let supply = coerce_scalar(&farm.total_supply);
                let symbol = farm.deposit_token.as_ref().map(|t| t.symbol.clone())?;
                if tvl <= MIN_DEPOSITS_USD || supply <= 0.0 || symbol.is_empty() {
                    return None;
                }
                Some(Pool {
                    project: "yield-yak".to_string(),
                    symbol,
                    chain: self.chain_name.clone(),
                    apy: Self::estimate_apy(farm, tvl),
                    tvl_usd: tvl,
                    category: farm.platform.clone(),
                    ..Pool::default()
                })
            })
            .collect();

        if pools.is_empty() {
            return Err(FetchError::no_data(format!(
                "no active yield yak farms found on chain {}",
                self.chain_id
            )));
        }

        pools.sort_by(|a, b| {
            b.tvl_usd
                .partial_cmp(&a.tvl_usd)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let significant_tvl: f64 = pools
            .iter()
            .filter(|p| p.tvl_usd > SIGNIFICANT_TVL_USD)
            .map(|p| p.tvl_usd)
            .sum();
        let summary = SourceSummary {
            total_count: pools.len(),
            active_count: pools.len(),
            total_tvl_usd: significant_tvl,
            avg_apy: crate::math::simple_average(pools.iter().map(|p| p.apy)),
            highest_apy: pools.iter().map(|p| p.apy).fold(0.0, f64::max),
        };

        info!(
            "✅ Yield Yak: {} farms on chain {}, top APY {:.1}%",
            summary.total_count, self.chain_id, summary.highest_apy
        );

        Ok(SourcePayload::YieldYak(FarmSet {
            summary,
            farms: pools,
        }))
    }
}
