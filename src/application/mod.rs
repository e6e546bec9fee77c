//! Application layer - aggregation orchestration

pub mod aggregator;

pub use aggregator::Aggregator;
