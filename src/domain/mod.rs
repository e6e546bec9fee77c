//! Domain layer - core business logic and entities

pub mod buckets;
pub mod incentives;
pub mod model;
pub mod strategies;
