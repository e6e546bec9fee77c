//! Aggregation orchestration: fan the adapter fetches out, join all
//! outcomes, and assemble one `MarketSnapshot`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info};

use crate::config::Config;
use crate::domain::buckets::{self, BucketEdges};
use crate::domain::incentives;
use crate::domain::model::{Pool, ProtocolSnapshot, Source, SourcePayload};
use crate::domain::strategies;
use crate::infrastructure::http::HttpApi;
use crate::report::{
    ApyTvl, AssetComparison, DataQuality, MarketAnalysis, MarketSnapshot, ProtocolComparison,
};
use crate::sources::{build_adapters, ProtocolAdapter};

pub struct Aggregator {
    adapters: Vec<Box<dyn ProtocolAdapter>>,
    bucket_edges: BucketEdges,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn ProtocolAdapter>>, bucket_edges: BucketEdges) -> Self {
        Self {
            adapters,
            bucket_edges,
        }
    }

    pub fn from_config(config: &Config, http: Arc<dyn HttpApi>) -> Self {
        Self::new(build_adapters(config, http), config.buckets)
    }

    /// Run one aggregation. Every fetch outcome is captured independently;
    /// one adapter failing never aborts the others, and total failure still
    /// yields a valid (Poor) snapshot.
    pub async fn run(&self) -> MarketSnapshot {
        let started = Instant::now();
        info!("🔄 Fetching {} sources...", self.adapters.len());

        let outcomes = join_all(self.adapters.iter().map(|adapter| async move {
            (adapter.source(), adapter.fetch().await)
        }))
        .await;

        // BTreeMap keyed by Source keeps the fixed assembly order regardless
        // of completion order.
        let mut protocols: BTreeMap<Source, ProtocolSnapshot> = BTreeMap::new();
        for (source, outcome) in outcomes {
            let snapshot = match outcome {
                Ok(payload) => ProtocolSnapshot::ok(source, payload),
                Err(e) => {
                    error!("❌ {} fetch failed: {}", source.name(), e);
                    ProtocolSnapshot::failed(source, e.to_string())
                }
            };
            protocols.insert(source, snapshot);
        }

        let data_quality = DataQuality::assess(&protocols);

        // Only successfully fetched pools feed the analytics; a failed
        // source contributes nothing, not zeros.
        let pools: Vec<Pool> = protocols
            .values()
            .flat_map(|s| s.pools().iter().cloned())
            .collect();

        let bucket_analysis = buckets::analyze(&pools, &self.bucket_edges);
        let incentives = incentives::analyze(&pools);
        let strategies = strategies::estimate(&protocols);
        let market_analysis = build_market_analysis(&protocols);
        let protocol_comparison = compare_lending_protocols(&protocols);

        let snapshot = MarketSnapshot {
            timestamp: Utc::now(),
            execution_time_ms: started.elapsed().as_millis() as u64,
            data_quality,
            protocols,
            bucket_analysis,
            incentives,
            strategies,
            market_analysis,
            protocol_comparison,
        };

        info!(
            "✅ Aggregation done in {}ms ({}/{} sources, {} pools)",
            snapshot.execution_time_ms,
            snapshot.data_quality.successful_sources.len(),
            snapshot.data_quality.total_sources,
            snapshot.bucket_analysis.total_pools
        );
        snapshot
    }
}

/// Fixed-threshold advisory notes. Advisory text only; nothing downstream
/// reads these.
fn build_market_analysis(protocols: &BTreeMap<Source, ProtocolSnapshot>) -> MarketAnalysis {
    let mut conditions = "Unknown".to_string();
    let mut risk_factors = Vec::new();
    let mut opportunities = Vec::new();

    let mut protocol_status = BTreeMap::new();
    for (source, snapshot) in protocols {
        let status = if snapshot.is_success() { "ONLINE" } else { "API_FAILED" };
        protocol_status.insert(*source, status.to_string());
    }

    if let Some(SourcePayload::Aave(market)) = payload(protocols, Source::Aave) {
        let utilization = market.rates.utilization_pct;
        if utilization > 80.0 {
            conditions = "High Demand".to_string();
            opportunities.push("High utilization suggests strong borrowing demand".to_string());
        } else if utilization < 40.0 {
            conditions = "Low Demand".to_string();
            risk_factors.push("Low utilization may indicate weak demand".to_string());
        } else {
            conditions = "Balanced".to_string();
        }

        if market.rates.borrow_apy > 8.0 {
            risk_factors.push("High borrowing costs increase liquidation risk".to_string());
        }
    }

    if let Some(SourcePayload::Euler(overview)) = payload(protocols, Source::Euler) {
        if overview.protocol.chain_tvl_usd > 1_000_000.0 {
            opportunities.push("Euler V2 has significant TVL on this chain".to_string());
        }
    }

    if let Some(SourcePayload::Beefy(vaults)) = payload(protocols, Source::Beefy) {
        if vaults.summary.highest_apy > 15.0 {
            opportunities.push("High-yield auto-compound opportunities available".to_string());
        }
    }

    MarketAnalysis {
        market_conditions: conditions,
        protocol_status,
        risk_factors,
        opportunities,
    }
}

/// Pair Euler and Aave pools by symbol from the market index. Needs the
/// Aave and Euler fetches plus the index itself to have succeeded; the
/// index payload is reused rather than re-fetched.
fn compare_lending_protocols(
    protocols: &BTreeMap<Source, ProtocolSnapshot>,
) -> Option<ProtocolComparison> {
    payload(protocols, Source::Aave)?;
    payload(protocols, Source::Euler)?;
    let index = match payload(protocols, Source::DefiLlama)? {
        SourcePayload::DefiLlama(index) => index,
        _ => return None,
    };

    let euler_pools: Vec<&Pool> = index
        .pools
        .iter()
        .filter(|p| p.project == "euler-v2")
        .collect();
    let aave_pools: Vec<&Pool> = index
        .pools
        .iter()
        .filter(|p| p.project == "aave-v3")
        .collect();

    let mut comparisons = Vec::new();
    for euler_pool in &euler_pools {
        if let Some(aave_pool) = aave_pools.iter().find(|a| a.symbol == euler_pool.symbol) {
            let apy_diff = euler_pool.apy - aave_pool.apy;
            comparisons.push(AssetComparison {
                asset: euler_pool.symbol.clone(),
                euler: ApyTvl {
                    apy: euler_pool.apy,
                    tvl_usd: euler_pool.tvl_usd,
                },
                aave: ApyTvl {
                    apy: aave_pool.apy,
                    tvl_usd: aave_pool.tvl_usd,
                },
                apy_diff,
                better_protocol: if apy_diff > 0.0 { "euler" } else { "aave" }.to_string(),
            });
        }
    }

    let euler_wins = comparisons.iter().filter(|c| c.better_protocol == "euler").count();
    let aave_wins = comparisons.len() - euler_wins;
    Some(ProtocolComparison {
        comparisons,
        euler_wins,
        aave_wins,
    })
}

fn payload(
    protocols: &BTreeMap<Source, ProtocolSnapshot>,
    source: Source,
) -> Option<&SourcePayload> {
    protocols.get(&source).and_then(|s| s.payload.as_ref())
}
