//! Beefy auto-compounding vault adapter.
//!
//! Combines three independent calls (vault registry, APY map, TVL map); all
//! three must succeed or the fetch fails naming the call that did not. APY
//! values are taken as already-percent; TVL values arrive in mixed shapes
//! (number, string, object keyed by chain) and go through the normalizer.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::model::{Pool, Source, SourcePayload, SourceSummary, VaultSet};
use crate::infrastructure::http::HttpApi;
use crate::shared::errors::FetchError;
use crate::shared::normalize::{coerce_number, coerce_scalar};
use crate::sources::ProtocolAdapter;

const VAULTS_URL: &str = "https://api.beefy.finance/vaults";
const APY_URL: &str = "https://api.beefy.finance/apy";
const TVL_URL: &str = "https://api.beefy.finance/tvl";

#[derive(Debug, Deserialize)]
struct BeefyVault {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    chain: String,
    #[serde(default)]
    status: String,
}

pub struct BeefyAdapter {
    http: Arc<dyn HttpApi>,
    chain_id: String,
    chain_name: String,
    nested_tvl_keys: Vec<String>,
}

impl BeefyAdapter {
    pub fn new(config: &Config, http: Arc<dyn HttpApi>) -> Self {
        Self {
            http,
            chain_id: config.chain.beefy_id.clone(),
            chain_name: config.chain.name.clone(),
            nested_tvl_keys: vec![
                "tvl".to_string(),
                config.chain.beefy_id.clone(),
                config.chain.name.to_lowercase(),
            ],
        }
    }

    fn vault_tvl(&self, tvls: &Value, id: &str) -> f64 {
        let keys: Vec<&str> = self.nested_tvl_keys.iter().map(String::as_str).collect();
        tvls.get(id)
            .map(|raw| coerce_number(raw, &keys))
            .unwrap_or(0.0)
    }
}

#[async_trait]
impl ProtocolAdapter for BeefyAdapter {
    fn source(&self) -> Source {
        Source::Beefy
    }

    async fn fetch(&self) -> Result<SourcePayload, FetchError> {
        let (vaults_raw, apys, tvls) = tokio::try_join!(
            self.http.get_json("Beefy vaults", VAULTS_URL),
            self.http.get_json("Beefy apy", APY_URL),
            self.http.get_json("Beefy tvl", TVL_URL),
        )?;

        let vaults: Vec<BeefyVault> = vaults_raw
            .as_array()
            .ok_or_else(|| FetchError::malformed("Beefy vaults", "expected a vault array"))?
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();

        let chain_vaults: Vec<&BeefyVault> =
            vaults.iter().filter(|v| v.chain == self.chain_id).collect();
        let active: Vec<&BeefyVault> = chain_vaults
            .iter()
            .copied()
            .filter(|v| v.status == "active")
            .collect();

        if active.is_empty() {
            return Err(FetchError::no_data(format!(
                "no active beefy vaults found on {}",
                self.chain_id
            )));
        }

        let mut pools: Vec<Pool> = active
            .iter()
            .map(|vault| {
                let apy = apys.get(&vault.id).map(coerce_scalar).unwrap_or(0.0);
                let symbol = if vault.name.is_empty() {
                    vault.id.clone()
                } else {
                    vault.name.clone()
                };
                Pool {
                    project: "beefy".to_string(),
                    symbol,
                    chain: self.chain_name.clone(),
                    apy,
                    tvl_usd: self.vault_tvl(&tvls, &vault.id),
                    ..Pool::default()
                }
            })
            .collect();
        pools.sort_by(|a, b| b.apy.partial_cmp(&a.apy).unwrap_or(std::cmp::Ordering::Equal));

        let total_tvl: f64 = pools.iter().map(|p| p.tvl_usd).sum();
        if total_tvl == 0.0 {
            warn!("⚠️ no valid TVL data found for any Beefy vault");
        }

        let summary = SourceSummary {
            total_count: chain_vaults.len(),
            active_count: pools.len(),
            total_tvl_usd: total_tvl,
            avg_apy: crate::math::simple_average(pools.iter().map(|p| p.apy)),
            highest_apy: pools.first().map(|p| p.apy).unwrap_or(0.0),
        };

        info!(
            "✅ Beefy: {} active vaults on {}, top APY {:.1}%",
            summary.active_count, self.chain_id, summary.highest_apy
        );

        Ok(SourcePayload::Beefy(VaultSet {
            summary,
            vaults: pools,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::tests_support::StaticApi;
    use serde_json::json;

    fn api() -> StaticApi {
        StaticApi::new()
            .route(
                "/vaults",
                json!([
                    {"id": "joe-usdc-avax", "name": "USDC-AVAX LP", "chain": "avax", "status": "active"},
                    {"id": "png-usdc", "name": "USDC", "chain": "avax", "status": "active"},
                    {"id": "retired-one", "name": "Old", "chain": "avax", "status": "eol"},
                    {"id": "eth-vault", "name": "ETH", "chain": "ethereum", "status": "active"}
                ]),
            )
            .route("/apy", json!({"joe-usdc-avax": 18.4, "png-usdc": "7.2"}))
            .route(
                "/tvl",
                json!({
                    "joe-usdc-avax": 250_000.0,
                    "png-usdc": {"avax": "90000"}
                }),
            )
    }

    #[tokio::test]
    async fn test_filters_chain_and_status_and_coerces_tvl() {
        let adapter = BeefyAdapter::new(&Config::default(), Arc::new(api()));
        let payload = adapter.fetch().await.unwrap();
        let set = match payload {
            SourcePayload::Beefy(v) => v,
            _ => panic!("wrong payload"),
        };

        assert_eq!(set.summary.total_count, 3);
        assert_eq!(set.summary.active_count, 2);
        // APY-descending
        assert_eq!(set.vaults[0].symbol, "USDC-AVAX LP");
        assert_eq!(set.vaults[0].apy, 18.4);
        assert_eq!(set.vaults[1].apy, 7.2);
        // nested-object TVL coerced through the chain key
        assert_eq!(set.vaults[1].tvl_usd, 90_000.0);
        assert_eq!(set.summary.total_tvl_usd, 340_000.0);
        assert_eq!(set.summary.highest_apy, 18.4);
    }

    #[tokio::test]
    async fn test_failed_call_is_named() {
        let api = StaticApi::new()
            .route("/vaults", json!([]))
            .fail("/apy", 502)
            .route("/tvl", json!({}));
        let adapter = BeefyAdapter::new(&Config::default(), Arc::new(api));
        let err = adapter.fetch().await.unwrap_err();
        assert!(err.to_string().contains("Beefy apy"));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_no_active_vaults_is_a_domain_error() {
        let api = StaticApi::new()
            .route("/vaults", json!([{"id": "x", "chain": "avax", "status": "eol"}]))
            .route("/apy", json!({}))
            .route("/tvl", json!({}));
        let adapter = BeefyAdapter::new(&Config::default(), Arc::new(api));
        let err = adapter.fetch().await.unwrap_err();
        assert!(err.to_string().contains("no active beefy vaults"));
    }
}
