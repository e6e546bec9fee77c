use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::domain::buckets::BucketEdges;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainCfg {
    /// Chain name as the yields index reports it.
    pub name: String,
    /// Chain id in Beefy's vault records.
    pub beefy_id: String,
    /// Numeric chain id in Yield Yak's farm records (43114 = Avalanche C-Chain).
    pub yak_chain_id: String,
}

impl Default for ChainCfg {
    fn default() -> Self {
        Self {
            name: "Avalanche".to_string(),
            beefy_id: "avax".to_string(),
            yak_chain_id: "43114".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    pub min_tvl_usd: f64,
    pub min_apy: f64,
    /// Target asset for the lending adapters.
    pub asset_symbol: String,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            min_tvl_usd: 5000.0,
            min_apy: 0.0,
            asset_symbol: "USDC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesCfg {
    pub aave: bool,
    pub beefy: bool,
    pub euler: bool,
    pub defillama: bool,
    pub yieldyak: bool,
}

impl Default for SourcesCfg {
    fn default() -> Self {
        Self {
            aave: true,
            beefy: true,
            euler: true,
            defillama: true,
            yieldyak: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chain: ChainCfg,
    pub filters: FilterCfg,
    pub buckets: BucketEdges,
    pub sources: SourcesCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&s).context("parse Config.toml")?;
        Ok(cfg)
    }
}
