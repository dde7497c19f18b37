//! fishcast library
//!
//! Forecast engine behind the `fishcast` binary: solunar astronomy, scoring,
//! weather aggregation and caching. Exposed for integration tests.

pub mod aggregator;
pub mod astronomy;
pub mod cache;
pub mod cli;
pub mod data;
pub mod forecast;
pub mod scoring;
