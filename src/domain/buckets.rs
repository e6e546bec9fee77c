//! APY bucket distribution and protocol-category breakdown.

use serde::{Deserialize, Serialize};

use crate::domain::model::Pool;
use crate::math::weighted_average_apy;

const BUCKET_TOP_POOLS: usize = 5;
const CATEGORY_TOP_POOLS: usize = 3;

/// Fixed APY range buckets; edges are half-open, values past `extreme` all
/// land in the Extreme bucket regardless of magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApyBucket {
    Conservative,
    Moderate,
    High,
    Extreme,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketEdges {
    pub moderate: f64,
    pub high: f64,
    pub extreme: f64,
}

impl Default for BucketEdges {
    fn default() -> Self {
        Self {
            moderate: 8.0,
            high: 15.0,
            extreme: 25.0,
        }
    }
}

impl BucketEdges {
    pub fn bucket_for(&self, apy: f64) -> ApyBucket {
        if apy < self.moderate {
            ApyBucket::Conservative
        } else if apy < self.high {
            ApyBucket::Moderate
        } else if apy < self.extreme {
            ApyBucket::High
        } else {
            ApyBucket::Extreme
        }
    }

    fn label(&self, bucket: ApyBucket) -> String {
        match bucket {
            ApyBucket::Conservative => format!("Conservative (0-{}%)", self.moderate),
            ApyBucket::Moderate => format!("Moderate ({}-{}%)", self.moderate, self.high),
            ApyBucket::High => format!("High ({}-{}%)", self.high, self.extreme),
            ApyBucket::Extreme => format!("Extreme ({}%+)", self.extreme),
        }
    }
}

/// Protocol family, assigned by the first matching rule in `CATEGORY_RULES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Lending,
    AutoCompound,
    Dex,
    YieldFarming,
    Leveraged,
    Other,
}

const LENDING_PROJECTS: &[&str] = &[
    "aave-v3",
    "euler-v2",
    "compound",
    "compound-v3",
    "radiant",
    "benqi",
];
const AUTO_COMPOUND_PROJECTS: &[&str] = &["beefy", "yearn", "yield-yak", "vector-finance"];
const DEX_PROJECTS: &[&str] = &[
    "trader-joe",
    "traderjoe",
    "pangolin",
    "sushiswap",
    "curve",
    "balancer",
];
const FARM_PROJECTS: &[&str] = &["gmx", "platypus", "wonderland"];
const LEVERAGE_PROJECTS: &[&str] = &["gearbox", "instadapp"];

/// APY above which an otherwise-unclassified pool reads as yield farming.
const FARMING_APY_THRESHOLD: f64 = 25.0;

fn is_lending(project: &str, symbol: &str, category: &str, _apy: f64) -> bool {
    LENDING_PROJECTS.contains(&project)
        || category == "lending"
        || (symbol.contains("supply") && !symbol.contains("lp"))
        || (symbol.contains("lend") && !symbol.contains("lp"))
}

fn is_auto_compound(project: &str, symbol: &str, _category: &str, _apy: f64) -> bool {
    AUTO_COMPOUND_PROJECTS.contains(&project)
        || symbol.contains("vault")
        || symbol.contains("auto")
        || project.contains("vault")
}

fn is_dex(project: &str, symbol: &str, category: &str, _apy: f64) -> bool {
    DEX_PROJECTS.contains(&project)
        || category == "dex"
        || symbol.contains("lp")
        || symbol.contains("pair")
        || symbol.contains("pool")
        || (symbol.contains('-')
            && (symbol.contains("usdc") || symbol.contains("avax") || symbol.contains("eth")))
}

fn is_yield_farming(project: &str, symbol: &str, category: &str, apy: f64) -> bool {
    FARM_PROJECTS.contains(&project)
        || category == "yield"
        || category == "farm"
        || apy > FARMING_APY_THRESHOLD
        || symbol.contains("farm")
        || symbol.contains("reward")
        || symbol.contains("stake")
        || project.contains("farm")
}

fn is_leveraged(project: &str, symbol: &str, _category: &str, _apy: f64) -> bool {
    LEVERAGE_PROJECTS.contains(&project)
        || symbol.contains("lev")
        || symbol.contains("margin")
        || project.contains("leverage")
}

type CategoryPredicate = fn(&str, &str, &str, f64) -> bool;

/// Ordered rule cascade; first match wins, `Other` is the fallback.
const CATEGORY_RULES: &[(Category, CategoryPredicate)] = &[
    (Category::Lending, is_lending),
    (Category::AutoCompound, is_auto_compound),
    (Category::Dex, is_dex),
    (Category::YieldFarming, is_yield_farming),
    (Category::Leveraged, is_leveraged),
];

pub fn classify(pool: &Pool) -> Category {
    let project = pool.project.to_lowercase();
    let symbol = pool.symbol.to_lowercase();
    let category = pool
        .category
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    for (cat, matches) in CATEGORY_RULES {
        if matches(&project, &symbol, &category, pool.apy) {
            return *cat;
        }
    }
    Category::Other
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub name: String,
    pub pool_count: usize,
    pub total_tvl_usd: f64,
    pub avg_apy: f64,
    pub top_pools: Vec<Pool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApyBuckets {
    pub conservative: BucketStats,
    pub moderate: BucketStats,
    pub high: BucketStats,
    pub extreme: BucketStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub pool_count: usize,
    pub avg_apy: f64,
    pub total_tvl_usd: f64,
    pub top_pools: Vec<Pool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub lending: CategoryStats,
    pub auto_compound: CategoryStats,
    pub dex: CategoryStats,
    pub yield_farming: CategoryStats,
    pub leveraged: CategoryStats,
    pub other: CategoryStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAnalysis {
    pub buckets: ApyBuckets,
    pub protocol_categories: CategoryBreakdown,
    pub weighted_average_apy: f64,
    pub total_pools: usize,
    pub total_tvl_usd: f64,
}

/// Classify every pool into exactly one APY bucket and one protocol category
/// and compute per-group aggregates. Pure; empty input yields all zeros.
pub fn analyze(pools: &[Pool], edges: &BucketEdges) -> BucketAnalysis {
    let mut by_bucket: [Vec<&Pool>; 4] = Default::default();
    let mut by_category: [Vec<&Pool>; 6] = Default::default();

    for pool in pools {
        let bucket_idx = match edges.bucket_for(pool.apy) {
            ApyBucket::Conservative => 0,
            ApyBucket::Moderate => 1,
            ApyBucket::High => 2,
            ApyBucket::Extreme => 3,
        };
        by_bucket[bucket_idx].push(pool);

        let cat_idx = match classify(pool) {
            Category::Lending => 0,
            Category::AutoCompound => 1,
            Category::Dex => 2,
            Category::YieldFarming => 3,
            Category::Leveraged => 4,
            Category::Other => 5,
        };
        by_category[cat_idx].push(pool);
    }

    let bucket_stats = |idx: usize, bucket: ApyBucket| -> BucketStats {
        let members = &by_bucket[idx];
        BucketStats {
            name: edges.label(bucket),
            pool_count: members.len(),
            total_tvl_usd: members.iter().map(|p| p.tvl_usd.max(0.0)).sum(),
            avg_apy: crate::math::simple_average(members.iter().map(|p| p.apy)),
            top_pools: top_by_apy(members, BUCKET_TOP_POOLS),
        }
    };

    let category_stats = |idx: usize| -> CategoryStats {
        let members = &by_category[idx];
        CategoryStats {
            pool_count: members.len(),
            avg_apy: crate::math::simple_average(members.iter().map(|p| p.apy)),
            total_tvl_usd: members.iter().map(|p| p.tvl_usd.max(0.0)).sum(),
            top_pools: top_by_apy(members, CATEGORY_TOP_POOLS),
        }
    };

    BucketAnalysis {
        buckets: ApyBuckets {
            conservative: bucket_stats(0, ApyBucket::Conservative),
            moderate: bucket_stats(1, ApyBucket::Moderate),
            high: bucket_stats(2, ApyBucket::High),
            extreme: bucket_stats(3, ApyBucket::Extreme),
        },
        protocol_categories: CategoryBreakdown {
            lending: category_stats(0),
            auto_compound: category_stats(1),
            dex: category_stats(2),
            yield_farming: category_stats(3),
            leveraged: category_stats(4),
            other: category_stats(5),
        },
        weighted_average_apy: weighted_average_apy(pools),
        total_pools: pools.len(),
        total_tvl_usd: pools.iter().map(|p| p.tvl_usd.max(0.0)).sum(),
    }
}

fn top_by_apy(members: &[&Pool], n: usize) -> Vec<Pool> {
    let mut sorted: Vec<&Pool> = members.to_vec();
    sorted.sort_by(|a, b| b.apy.partial_cmp(&a.apy).unwrap_or(std::cmp::Ordering::Equal));
    sorted.into_iter().take(n).cloned().collect()
}
