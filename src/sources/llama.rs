//! Shared wire types for the DeFiLlama yields and protocol endpoints, used
//! by the Aave, Euler and market-index adapters.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::model::{Pool, ProtocolHeader};
use crate::shared::errors::FetchError;
use crate::shared::normalize::coerce_scalar;

pub const YIELDS_POOLS_URL: &str = "https://yields.llama.fi/pools";
pub const PROTOCOL_BASE_URL: &str = "https://api.llama.fi/protocol";

/// One entry of the yields index. Every field is optional upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlamaPool {
    pub project: String,
    pub chain: String,
    pub symbol: String,
    pub apy: Option<f64>,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub apy_base_borrow: Option<f64>,
    pub tvl_usd: Option<f64>,
    pub category: Option<String>,
    /// 0-1 fraction upstream.
    pub utilization: Option<f64>,
    pub ltv: Option<f64>,
    pub liquidation_threshold: Option<f64>,
    pub liquidation_bonus: Option<f64>,
    pub reward_tokens: Option<Vec<String>>,
}

impl LlamaPool {
    pub fn apy(&self) -> f64 {
        self.apy.unwrap_or(0.0)
    }

    pub fn tvl_usd(&self) -> f64 {
        self.tvl_usd.unwrap_or(0.0)
    }

    pub fn to_pool(&self) -> Pool {
        Pool {
            project: self.project.clone(),
            symbol: self.symbol.clone(),
            chain: self.chain.clone(),
            apy: self.apy(),
            apy_base: self.apy_base.unwrap_or(0.0),
            apy_reward: self.apy_reward.unwrap_or(0.0),
            tvl_usd: self.tvl_usd(),
            category: self.category.clone(),
            reward_tokens: self.reward_tokens.clone().unwrap_or_default(),
        }
    }
}

/// Parse the `data` array of the yields index; entries with unexpected
/// shapes are skipped rather than failing the whole response.
pub fn parse_pools(call: &str, raw: &Value) -> Result<Vec<LlamaPool>, FetchError> {
    let data = raw
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FetchError::malformed(call, "missing `data` array"))?;

    Ok(data
        .iter()
        .filter_map(|entry| serde_json::from_value::<LlamaPool>(entry.clone()).ok())
        .collect())
}

/// Extract the protocol header from an `api.llama.fi/protocol/{slug}`
/// response. The endpoint mixes numbers and nested objects, so everything
/// goes through the coercion helpers.
pub fn parse_protocol_header(raw: &Value, chain: &str) -> ProtocolHeader {
    let chain_key = chain.to_lowercase();
    let chain_tvl = raw
        .get("chainTvls")
        .and_then(|t| t.get(&chain_key))
        .map(coerce_scalar)
        .unwrap_or(0.0);

    ProtocolHeader {
        name: raw
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        total_tvl_usd: raw.get("tvl").map(coerce_scalar).unwrap_or(0.0),
        chain_tvl_usd: chain_tvl,
        change_24h: raw.get("change_1d").map(coerce_scalar).unwrap_or(0.0),
    }
}

/// Sort pools TVL-descending in place.
pub fn sort_by_tvl_desc(pools: &mut [LlamaPool]) {
    pools.sort_by(|a, b| {
        b.tvl_usd()
            .partial_cmp(&a.tvl_usd())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
