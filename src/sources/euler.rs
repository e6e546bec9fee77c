//! Euler V2 lending adapter.
//!
//! Two calls: the protocol header and the yields index. Both must succeed;
//! a failure names the call that broke.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::domain::model::{
    LendingMarketOverview, Pool, Source, SourcePayload, SourceSummary,
};
use crate::infrastructure::http::HttpApi;
use crate::shared::errors::FetchError;
use crate::sources::llama::{
    parse_pools, parse_protocol_header, sort_by_tvl_desc, PROTOCOL_BASE_URL, YIELDS_POOLS_URL,
};
use crate::sources::ProtocolAdapter;

const PROJECT: &str = "euler-v2";
const PROTOCOL_CALL: &str = "Euler protocol";
const YIELDS_CALL: &str = "Euler yields";

pub struct EulerAdapter {
    http: Arc<dyn HttpApi>,
    chain: String,
}

impl EulerAdapter {
    pub fn new(config: &Config, http: Arc<dyn HttpApi>) -> Self {
        Self {
            http,
            chain: config.chain.name.clone(),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for EulerAdapter {
    fn source(&self) -> Source {
        Source::Euler
    }

    async fn fetch(&self) -> Result<SourcePayload, FetchError> {
        let protocol_url = format!("{}/{}", PROTOCOL_BASE_URL, PROJECT);
        let (protocol_raw, yields_raw) = tokio::try_join!(
            self.http.get_json(PROTOCOL_CALL, &protocol_url),
            self.http.get_json(YIELDS_CALL, YIELDS_POOLS_URL),
        )?;

        let protocol = parse_protocol_header(&protocol_raw, &self.chain);

        let mut matches: Vec<_> = parse_pools(YIELDS_CALL, &yields_raw)?
            .into_iter()
            .filter(|p| p.project == PROJECT && p.chain == self.chain)
            .collect();

        if matches.is_empty() {
            return Err(FetchError::no_data(format!(
                "no {} pools found on {}",
                PROJECT, self.chain
            )));
        }

        sort_by_tvl_desc(&mut matches);
        let pools: Vec<Pool> = matches.iter().map(|p| p.to_pool()).collect();

        let summary = SourceSummary {
            total_count: pools.len(),
            active_count: pools.len(),
            total_tvl_usd: pools.iter().map(|p| p.tvl_usd).sum(),
            avg_apy: crate::math::simple_average(pools.iter().map(|p| p.apy)),
            highest_apy: pools
                .iter()
                .map(|p| p.apy)
                .fold(0.0, f64::max),
        };

        info!(
            "✅ Euler: {} pools on {}, ${:.0} TVL",
            summary.total_count, self.chain, summary.total_tvl_usd
        );

        Ok(SourcePayload::Euler(LendingMarketOverview {
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
                json!({"name": "Euler V2", "tvl": 4_000_000.0, "change_1d": 2.5,
                       "chainTvls": {"avalanche": 1_500_000.0}}),
            )
            .route(
                "yields.llama.fi",
                json!({"data": [
                    {"project": "euler-v2", "chain": "Avalanche", "symbol": "USDC", "apy": 5.5, "tvlUsd": 800_000.0},
                    {"project": "euler-v2", "chain": "Avalanche", "symbol": "USDT", "apy": 7.1, "tvlUsd": 1_200_000.0},
                    {"project": "euler-v2", "chain": "Ethereum", "symbol": "USDC", "apy": 4.0, "tvlUsd": 9_000_000.0},
                    {"project": "aave-v3", "chain": "Avalanche", "symbol": "USDC", "apy": 4.2, "tvlUsd": 5_000_000.0}
                ]}),
            )
    }

    #[tokio::test]
    async fn test_filters_and_sorts_chain_pools() {
        let adapter = EulerAdapter::new(&Config::default(), Arc::new(api()));
        let payload = adapter.fetch().await.unwrap();
        let overview = match payload {
            SourcePayload::Euler(o) => o,
            _ => panic!("wrong payload"),
        };

        assert_eq!(overview.protocol.name, "Euler V2");
        assert_eq!(overview.protocol.chain_tvl_usd, 1_500_000.0);
        assert_eq!(overview.pools.len(), 2);
        // TVL-descending
        assert_eq!(overview.pools[0].symbol, "USDT");
        assert_eq!(overview.summary.total_tvl_usd, 2_000_000.0);
        assert!((overview.summary.highest_apy - 7.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_protocol_call_failure_is_named() {
        let api = StaticApi::new()
            .fail("api.llama.fi/protocol", 500)
            .route("yields.llama.fi", json!({"data": []}));
        let adapter = EulerAdapter::new(&Config::default(), Arc::new(api));
        let err = adapter.fetch().await.unwrap_err();
        assert!(err.to_string().contains("Euler protocol"));
    }

    #[tokio::test]
    async fn test_no_chain_pools_is_a_domain_error() {
        let api = StaticApi::new()
            .route("api.llama.fi/protocol", json!({"name": "Euler V2"}))
            .route("yields.llama.fi", json!({"data": [
                {"project": "euler-v2", "chain": "Ethereum", "symbol": "USDC", "apy": 4.0}
            ]}));
        let adapter = EulerAdapter::new(&Config::default(), Arc::new(api));
        let err = adapter.fetch().await.unwrap_err();
        assert!(err.to_string().contains("no euler-v2 pools found on Avalanche"));
    }
}
