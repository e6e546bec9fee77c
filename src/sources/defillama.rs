//! Market-wide yields index adapter.
//!
//! Pulls the whole yields index plus the Aave protocol header and keeps the
//! target-chain pools that pass the TVL/APY floors and a category/project
//! whitelist. This payload feeds the bulk of the bucket and incentive
//! analytics.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::domain::model::{MarketIndex, Pool, Source, SourcePayload, SourceSummary};
use crate::infrastructure::http::HttpApi;
use crate::shared::errors::FetchError;
use crate::sources::llama::{
    parse_pools, parse_protocol_header, sort_by_tvl_desc, LlamaPool, PROTOCOL_BASE_URL,
    YIELDS_POOLS_URL,
};
use crate::sources::ProtocolAdapter;

const PROTOCOL_CALL: &str = "DeFiLlama protocol";
const YIELDS_CALL: &str = "DeFiLlama yields";

/// Protocol header tracked alongside the index.
const HEADER_PROJECT: &str = "aave-v3";

const MAX_POOLS: usize = 100;

const CATEGORY_WHITELIST: &[&str] = &["lending", "dex", "yield", "farm"];
const PROJECT_WHITELIST: &[&str] = &[
    // Lending
    "aave-v3",
    "euler-v2",
    "compound-v3",
    "radiant",
    // Auto-compound
    "beefy",
    "yearn",
    "yield-yak",
    "vector-finance",
    // DEX
    "trader-joe",
    "traderjoe",
    "pangolin",
    "sushiswap",
    "curve",
    "balancer",
    // Yield farming
    "gmx",
    "platypus",
    "benqi",
    "wonderland",
    // Leveraged
    "gearbox",
    "instadapp",
];

pub struct DefiLlamaAdapter {
    http: Arc<dyn HttpApi>,
    chain: String,
    min_tvl_usd: f64,
    min_apy: f64,
}

impl DefiLlamaAdapter {
    pub fn new(config: &Config, http: Arc<dyn HttpApi>) -> Self {
        Self {
            http,
            chain: config.chain.name.clone(),
            min_tvl_usd: config.filters.min_tvl_usd,
            min_apy: config.filters.min_apy,
        }
    }

    fn in_scope(&self, pool: &LlamaPool) -> bool {
        if pool.chain != self.chain || pool.tvl_usd() <= self.min_tvl_usd || pool.apy() <= self.min_apy
        {
            return false;
        }
        let project = pool.project.to_lowercase();
        let symbol = pool.symbol.to_lowercase();
        let category = pool
            .category
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        CATEGORY_WHITELIST.contains(&category.as_str())
            || PROJECT_WHITELIST.contains(&project.as_str())
            || project.contains("avax")
            || project.contains("avalanche")
            || symbol.contains("avax")
    }
}

#[async_trait]
impl ProtocolAdapter for DefiLlamaAdapter {
    fn source(&self) -> Source {
        Source::DefiLlama
    }

    async fn fetch(&self) -> Result<SourcePayload, FetchError> {
        let protocol_url = format!("{}/{}", PROTOCOL_BASE_URL, HEADER_PROJECT);
        let (protocol_raw, yields_raw) = tokio::try_join!(
            self.http.get_json(PROTOCOL_CALL, &protocol_url),
            self.http.get_json(YIELDS_CALL, YIELDS_POOLS_URL),
        )?;

        let protocol = parse_protocol_header(&protocol_raw, &self.chain);

        let mut matches: Vec<LlamaPool> = parse_pools(YIELDS_CALL, &yields_raw)?
            .into_iter()
            .filter(|p| self.in_scope(p))
            .collect();

        if matches.is_empty() {
            return Err(FetchError::no_data(format!(
                "no pools matched the {} market filter",
                self.chain
            )));
        }

        sort_by_tvl_desc(&mut matches);
        matches.truncate(MAX_POOLS);
        let pools: Vec<Pool> = matches.iter().map(|p| p.to_pool()).collect();

        let valid_count = pools.iter().filter(|p| p.apy > 0.0).count();
        let summary = SourceSummary {
            total_count: pools.len(),
            active_count: valid_count,
            total_tvl_usd: pools.iter().map(|p| p.tvl_usd).sum(),
            avg_apy: crate::math::simple_average(
                pools.iter().filter(|p| p.apy > 0.0).map(|p| p.apy),
            ),
            highest_apy: pools.iter().map(|p| p.apy).fold(0.0, f64::max),
        };

        info!(
            "✅ DeFiLlama index: {} pools on {} (${:.1}M TVL)",
            summary.total_count,
            self.chain,
            summary.total_tvl_usd / 1_000_000.0
        );

        Ok(SourcePayload::DefiLlama(MarketIndex {
            protocol,
            summary,
            pools,
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
                "api.llama.fi/protocol",
                json!({"name": "AAVE V3", "tvl": 10_000_000.0, "chainTvls": {"avalanche": 3_000_000.0}}),
            )
            .route(
                "yields.llama.fi",
                json!({"data": [
                    {"project": "aave-v3", "chain": "Avalanche", "symbol": "USDC",
                     "category": "Lending", "apy": 4.2, "tvlUsd": 5_000_000.0},
                    {"project": "obscure-fork", "chain": "Avalanche", "symbol": "WAVAX",
                     "apy": 12.0, "tvlUsd": 80_000.0},
                    {"project": "obscure-fork", "chain": "Avalanche", "symbol": "XYZ",
                     "apy": 12.0, "tvlUsd": 80_000.0},
                    {"project": "tiny", "chain": "Avalanche", "symbol": "AVAX",
                     "apy": 9.0, "tvlUsd": 100.0},
                    {"project": "trader-joe", "chain": "Avalanche", "symbol": "JOE-AVAX LP",
                     "apy": 0.0, "tvlUsd": 900_000.0},
                    {"project": "gmx", "chain": "Arbitrum", "symbol": "GLP",
                     "apy": 20.0, "tvlUsd": 50_000_000.0}
                ]}),
            )
    }

    #[tokio::test]
    async fn test_market_filter() {
        let adapter = DefiLlamaAdapter::new(&Config::default(), Arc::new(api()));
        let payload = adapter.fetch().await.unwrap();
        let index = match payload {
            SourcePayload::DefiLlama(i) => i,
            _ => panic!("wrong payload"),
        };

        // kept: aave (category), WAVAX fork (symbol pattern).
        // dropped: XYZ fork (no whitelist hit), tiny (TVL floor),
        // zero-APY joe pool (APY floor), GLP (wrong chain).
        assert_eq!(index.pools.len(), 2);
        assert_eq!(index.pools[0].project, "aave-v3");
        assert_eq!(index.summary.active_count, 2);
        assert_eq!(index.protocol.chain_tvl_usd, 3_000_000.0);
    }

    #[tokio::test]
    async fn test_empty_filter_result_is_a_domain_error() {
        let api = StaticApi::new()
            .route("api.llama.fi/protocol", json!({"name": "AAVE V3"}))
            .route("yields.llama.fi", json!({"data": []}));
        let adapter = DefiLlamaAdapter::new(&Config::default(), Arc::new(api));
        let err = adapter.fetch().await.unwrap_err();
        assert!(err.to_string().contains("market filter"));
    }

    #[tokio::test]
    async fn test_pool_cap() {
        let mut data = Vec::new();
        for i in 0..150 {
            data.push(json!({
                "project": "aave-v3", "chain": "Avalanche", "symbol": format!("P{i}"),
                "category": "Lending", "apy": 3.0, "tvlUsd": 10_000.0 + i as f64
            }));
        }
        let api = StaticApi::new()
            .route("api.llama.fi/protocol", json!({"name": "AAVE V3"}))
            .route("yields.llama.fi", json!({"data": data}));
        let adapter = DefiLlamaAdapter::new(&Config::default(), Arc::new(api));
        let payload = adapter.fetch().await.unwrap();
        let index = match payload {
            SourcePayload::DefiLlama(i) => i,
            _ => panic!("wrong payload"),
        };
        assert_eq!(index.pools.len(), 100);
        // deepest first after the cap
        assert_eq!(index.pools[0].tvl_usd, 10_149.0);
    }
}
