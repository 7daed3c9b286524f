//! Year-bucket commit aggregation.
//!
//! Fans out one commit-count query per contribution year and sums the
//! results. Any failure zeroes the whole aggregate: a partial sum is never
//! reported as a total.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::github::queries::{
    period_start, yearly_commits_variables, YearlyCommitsData, YEARLY_COMMITS,
};
use crate::github::QueryExecutor;
use crate::models::{CommitAggregate, DegradeReason, YearlyCommitTotals};
use crate::validation::is_well_formed_handle;

/// Default cap on per-year requests in flight. Covers every year GitHub
/// has existed, so in practice all years are requested at once.
pub const DEFAULT_YEAR_CONCURRENCY: usize = 20;

pub struct YearBucketAggregator {
    executor: Arc<dyn QueryExecutor>,
    max_in_flight: usize,
}

impl YearBucketAggregator {
    pub fn new(executor: Arc<dyn QueryExecutor>, max_in_flight: usize) -> Self {
        Self {
            executor,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Sum public and private commits over `years` for `login`.
    ///
    /// Never fails: a malformed login or any failed year yields a zeroed
    /// aggregate tagged with the reason.
    pub async fn aggregate(&self, login: &str, years: &[i32]) -> CommitAggregate {
        if !is_well_formed_handle(login) {
            warn!("Skipping commit history for malformed login {:?}", login);
            return CommitAggregate::degraded(DegradeReason::MalformedHandle);
        }

        info!(
            "Fetching commit history for {} across {} years",
            login,
            years.len()
        );

        let merged = stream::iter(years.iter().copied())
            .map(|year| self.fetch_year(login, year))
            .buffer_unordered(self.max_in_flight)
            .try_fold(YearlyCommitTotals::default(), |acc, totals| async move {
                Ok::<_, DegradeReason>(acc + totals)
            })
            .await;

        match merged {
            Ok(totals) => {
                debug!(
                    "Commit history for {}: {} public, {} private",
                    login, totals.public_count, totals.private_count
                );
                CommitAggregate::complete(totals)
            }
            Err(reason) => {
                warn!("Commit history for {} degraded: {}", login, reason);
                CommitAggregate::degraded(reason)
            }
        }
    }

    async fn fetch_year(
        &self,
        login: &str,
        year: i32,
    ) -> Result<YearlyCommitTotals, DegradeReason> {
        let failed = |message: String| DegradeReason::QueryFailed { year, message };

        let from = period_start(year).ok_or_else(|| failed("year out of range".to_string()))?;

        let envelope = self
            .executor
            .execute(&YEARLY_COMMITS, yearly_commits_variables(login, &from))
            .await
            .map_err(|e| failed(e.to_string()))?;

        if envelope.has_errors() {
            let message = envelope.first_error_message().unwrap_or("upstream error");
            return Err(failed(message.to_string()));
        }

        let data: YearlyCommitsData =
            serde_json::from_value(envelope.data.unwrap_or(Value::Null))
                .map_err(|e| failed(e.to_string()))?;
        let user = data
            .user
            .ok_or_else(|| failed("user missing from response".to_string()))?;

        let counts = user.contributions_collection;
        Ok(YearlyCommitTotals {
            public_count: counts.total_commit_contributions,
            private_count: counts.restricted_contributions_count,
        })
    }
}
