//! Profile aggregation pipeline.
//!
//! The assembler runs the primary query, optionally delegates commit history
//! to the year-bucket aggregator, and hands the derived metrics to a scorer.

pub mod aggregator;
pub mod profile;
pub mod rank;

pub use aggregator::{YearBucketAggregator, DEFAULT_YEAR_CONCURRENCY};
pub use profile::{ProfileAssembler, StatsOptions};
pub use rank::{RankScorer, WeightedRank};
