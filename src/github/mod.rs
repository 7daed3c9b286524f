//! GitHub GraphQL access.
//!
//! This module provides the query executor seam used by the aggregation
//! pipeline, the production HTTP client behind it, and the query documents.

pub mod client;
pub mod executor;
#[cfg(test)]
pub mod mock;
pub mod queries;

pub use client::{ClientConfig, GithubClient, RetryConfig};
pub use executor::QueryExecutor;
