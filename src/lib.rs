//! Yieldlens - Avalanche DeFi yield aggregator
//! Built with Domain-Driven Design principles

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod report;
pub mod shared;
pub mod sources;

// Re-export main types for convenience
pub use application::Aggregator;
pub use config::Config;
pub use domain::model::{Pool, ProtocolSnapshot, Source};
pub use infrastructure::http::{HttpApi, ReqwestApi};
pub use report::MarketSnapshot;
