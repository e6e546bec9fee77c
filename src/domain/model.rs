//! Core domain types shared by adapters and analytics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream data sources, in fixed assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    Aave,
    Beefy,
    Euler,
    DefiLlama,
    YieldYak,
}

impl Source {
    /// Deterministic order used for joining results and assembling output.
    pub const ALL: [Source; 5] = [
        Source::Aave,
        Source::Beefy,
        Source::Euler,
        Source::DefiLlama,
        Source::YieldYak,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Aave => "aave-v3",
            Source::Beefy => "beefy",
            Source::Euler => "euler-v2",
            Source::DefiLlama => "defillama",
            Source::YieldYak => "yield-yak",
        }
    }
}

/// A single yield-bearing opportunity, normalized across sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pool {
    pub project: String,
    pub symbol: String,
    pub chain: String,
    /// Total APY in percent. Raw upstream values may be absurd; the
    /// incentive analyzer clamps anything past the anomaly threshold.
    pub apy: f64,
    /// Explicit base component in percent; 0 means not separately reported.
    pub apy_base: f64,
    /// Explicit reward component in percent; 0 means not separately reported.
    pub apy_reward: f64,
    pub tvl_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reward_tokens: Vec<String>,
}

impl Pool {
    pub fn has_explicit_breakdown(&self) -> bool {
        self.apy_base > 0.0 || self.apy_reward > 0.0
    }
}

/// Three-step risk label used for utilization and liquidity assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

/// Lending market rates plus LTV-derived leverage parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingRates {
    pub supply_apy: f64,
    pub borrow_apy: f64,
    /// Utilization in percent (upstream reports a 0-1 fraction).
    pub utilization_pct: f64,
    pub total_liquidity_usd: f64,
    pub total_debt_usd: f64,
    pub ltv: f64,
    pub liquidation_threshold: f64,
    pub liquidation_bonus: f64,
    pub max_leverage: f64,
    pub safe_max_leverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub borrow_rate_spread: f64,
    pub utilization_risk: RiskLabel,
    pub liquidity_risk: RiskLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AaveMarket {
    pub rates: LendingRates,
    pub risk_metrics: RiskMetrics,
    pub pool: Pool,
}

/// Per-source pool/vault/farm roll-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub total_count: usize,
    pub active_count: usize,
    pub total_tvl_usd: f64,
    pub avg_apy: f64,
    pub highest_apy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSet {
    pub summary: SourceSummary,
    /// Vaults normalized to pools, APY-descending.
    pub vaults: Vec<Pool>,
}

/// Protocol-level header from the DeFiLlama protocol endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolHeader {
    pub name: String,
    pub total_tvl_usd: f64,
    pub chain_tvl_usd: f64,
    pub change_24h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingMarketOverview {
    pub protocol: ProtocolHeader,
    pub summary: SourceSummary,
    /// Chain pools, TVL-descending.
    pub pools: Vec<Pool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub protocol: ProtocolHeader,
    pub summary: SourceSummary,
    /// Filtered market-wide pools, TVL-descending, capped at 100.
    pub pools: Vec<Pool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSet {
    pub summary: SourceSummary,
    /// Farms normalized to pools, TVL-descending.
    pub farms: Vec<Pool>,
}

/// Typed payload per source, produced only on a successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourcePayload {
    Aave(AaveMarket),
    Beefy(VaultSet),
    Euler(LendingMarketOverview),
    DefiLlama(MarketIndex),
    YieldYak(FarmSet),
}

impl SourcePayload {
    /// Normalized pools carried by this payload, for merged analytics.
    pub fn pools(&self) -> &[Pool] {
        match self {
            SourcePayload::Aave(m) => std::slice::from_ref(&m.pool),
            SourcePayload::Beefy(v) => &v.vaults,
            SourcePayload::Euler(o) => &o.pools,
            SourcePayload::DefiLlama(i) => &i.pools,
            SourcePayload::YieldYak(f) => &f.farms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Failed,
}

/// Per-source fetch result. Exactly one of `payload`/`error` is populated,
/// determined by `status`; the constructors are the only way to build one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSnapshot {
    pub source: Source,
    pub status: FetchStatus,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<SourcePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProtocolSnapshot {
    pub fn ok(source: Source, payload: SourcePayload) -> Self {
        Self {
            source,
            status: FetchStatus::Success,
            fetched_at: Utc::now(),
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failed(source: Source, error: impl Into<String>) -> Self {
        Self {
            source,
            status: FetchStatus::Failed,
            fetched_at: Utc::now(),
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    pub fn pools(&self) -> &[Pool] {
        self.payload.as_ref().map(|p| p.pools()).unwrap_or(&[])
    }
}
