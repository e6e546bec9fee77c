// src/report.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::buckets::BucketAnalysis;
use crate::domain::incentives::IncentiveOverview;
use crate::domain::model::{ProtocolSnapshot, Source};
use crate::domain::strategies::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    Good,
    Partial,
    Poor,
}

/// Fraction of configured sources that returned usable data this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub score: f64,
    pub level: QualityLevel,
    pub successful_sources: Vec<Source>,
    pub failed_sources: Vec<Source>,
    pub total_sources: usize,
}

impl DataQuality {
    pub fn assess(protocols: &BTreeMap<Source, ProtocolSnapshot>) -> Self {
        let successful_sources: Vec<Source> = protocols
            .iter()
            .filter(|(_, s)| s.is_success())
            .map(|(source, _)| *source)
            .collect();
        let failed_sources: Vec<Source> = protocols
            .iter()
            .filter(|(_, s)| !s.is_success())
            .map(|(source, _)| *source)
            .collect();

        let total = protocols.len();
        let score = if total == 0 {
            0.0
        } else {
            successful_sources.len() as f64 / total as f64
        };
        let level = if score >= 0.75 {
            QualityLevel::Good
        } else if score >= 0.5 {
            QualityLevel::Partial
        } else {
            QualityLevel::Poor
        };

        Self {
            score,
            level,
            successful_sources,
            failed_sources,
            total_sources: total,
        }
    }
}

/// Advisory threshold-based notes; never consumed by other calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub market_conditions: String,
    pub protocol_status: BTreeMap<Source, String>,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApyTvl {
    pub apy: f64,
    pub tvl_usd: f64,
}

/// Per-asset Aave vs Euler comparison, paired by symbol from the market
/// index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetComparison {
    pub asset: String,
    pub euler: ApyTvl,
    pub aave: ApyTvl,
    pub apy_diff: f64,
    pub better_protocol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolComparison {
    pub comparisons: Vec<AssetComparison>,
    pub euler_wins: usize,
    pub aave_wins: usize,
}

/// Top-level result of one aggregation run. Constructed fresh per run and
/// never mutated; the caller owns any export or storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub execution_time_ms: u64,
    pub data_quality: DataQuality,
    pub protocols: BTreeMap<Source, ProtocolSnapshot>,
    pub bucket_analysis: BucketAnalysis,
    pub incentives: IncentiveOverview,
    pub strategies: BTreeMap<String, Strategy>,
    pub market_analysis: MarketAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_comparison: Option<ProtocolComparison>,
}

impl MarketSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
