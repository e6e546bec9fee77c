//! Infrastructure layer - external service implementations

pub mod http;
