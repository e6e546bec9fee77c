//! Shared components - common errors and normalization utilities

pub mod errors;
pub mod normalize;
