use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use yieldlens::application::Aggregator;
use yieldlens::config::Config;
use yieldlens::infrastructure::http::ReqwestApi;

#[derive(Parser, Debug)]
#[command(version, about = "DeFi yield aggregator and analytics for Avalanche protocols")]
struct Args {
    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Chain name filter (overrides config)
    #[arg(long)]
    chain: Option<String>,

    /// Minimum pool TVL in USD (overrides config)
    #[arg(long)]
    min_tvl: Option<f64>,

    /// Minimum pool APY in percent (overrides config)
    #[arg(long)]
    min_apy: Option<f64>,

    /// Target asset symbol for the lending adapters (overrides config)
    #[arg(long)]
    asset: Option<String>,

    /// Disable the Aave source
    #[arg(long)]
    no_aave: bool,

    /// Disable the Beefy source
    #[arg(long)]
    no_beefy: bool,

    /// Disable the Euler source
    #[arg(long)]
    no_euler: bool,

    /// Disable the DeFiLlama market index source
    #[arg(long)]
    no_defillama: bool,

    /// Disable the Yield Yak source
    #[arg(long)]
    no_yieldyak: bool,

    /// Write the snapshot JSON to this path
    #[arg(long)]
    export: Option<String>,

    /// Pretty-print the snapshot to stdout
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    // Priority: CLI args > Config file > Defaults
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    if let Some(chain) = args.chain {
        config.chain.name = chain;
    }
    if let Some(min_tvl) = args.min_tvl {
        config.filters.min_tvl_usd = min_tvl;
    }
    if let Some(min_apy) = args.min_apy {
        config.filters.min_apy = min_apy;
    }
    if let Some(asset) = args.asset {
        config.filters.asset_symbol = asset;
    }
    if args.no_aave {
        config.sources.aave = false;
    }
    if args.no_beefy {
        config.sources.beefy = false;
    }
    if args.no_euler {
        config.sources.euler = false;
    }
    if args.no_defillama {
        config.sources.defillama = false;
    }
    if args.no_yieldyak {
        config.sources.yieldyak = false;
    }

    let aggregator = Aggregator::from_config(&config, Arc::new(ReqwestApi::new()));
    let snapshot = aggregator.run().await;

    let json = if args.pretty {
        snapshot.to_json_pretty()?
    } else {
        snapshot.to_json()?
    };
    println!("{json}");

    if let Some(path) = args.export {
        fs::write(&path, snapshot.to_json_pretty()?)
            .with_context(|| format!("write snapshot to {path}"))?;
    }

    Ok(())
}
