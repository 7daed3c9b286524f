//! Data models for the profile aggregator.
//!
//! This module contains the records produced by the aggregation pipeline:
//! the final statistics profile, the rank attached to it, and the
//! ephemeral per-year and merged commit totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Where `total_commits` came from for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSource {
    /// Commit totals of the current contribution period (primary query).
    CurrentPeriod,
    /// Sum over every contribution year (year-bucket aggregation).
    AllTime,
}

impl fmt::Display for CommitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitSource::CurrentPeriod => write!(f, "current period"),
            CommitSource::AllTime => write!(f, "all time"),
        }
    }
}

/// Tier label and percentile produced by a [`crate::analysis::RankScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub level: String,
    pub score: f64,
}

/// The seven metrics handed to the scoring adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankInput {
    /// Set when `total_commits` covers every contribution year.
    pub all_commits: bool,
    pub total_commits: u64,
    pub total_repos: u64,
    pub followers: u64,
    pub contributions: u64,
    pub stargazers: u64,
    pub prs: u64,
    pub issues: u64,
}

/// Public and private commit counts reported for one contribution year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearlyCommitTotals {
    pub public_count: u64,
    pub private_count: u64,
}

impl Add for YearlyCommitTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            public_count: self.public_count + rhs.public_count,
            private_count: self.private_count + rhs.private_count,
        }
    }
}

/// Why a historical aggregation was zeroed instead of returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DegradeReason {
    /// The login failed the handle check; no request was issued.
    MalformedHandle,
    /// A per-year query failed, discarding every other year.
    QueryFailed { year: i32, message: String },
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::MalformedHandle => write!(f, "malformed handle"),
            DegradeReason::QueryFailed { year, message } => {
                write!(f, "query for {} failed: {}", year, message)
            }
        }
    }
}

/// Outcome tag of a historical aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregateStatus {
    Complete,
    Degraded(DegradeReason),
}

/// Merged commit totals across all contribution years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAggregate {
    pub total_public_commits: u64,
    pub total_private_commits: u64,
    pub status: AggregateStatus,
}

impl CommitAggregate {
    /// A finished aggregation over the given merged totals.
    pub fn complete(totals: YearlyCommitTotals) -> Self {
        Self {
            total_public_commits: totals.public_count,
            total_private_commits: totals.private_count,
            status: AggregateStatus::Complete,
        }
    }

    /// A zeroed aggregate standing in for a failed one.
    pub fn degraded(reason: DegradeReason) -> Self {
        Self {
            total_public_commits: 0,
            total_private_commits: 0,
            status: AggregateStatus::Degraded(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, AggregateStatus::Degraded(_))
    }
}

/// The assembled developer activity profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsProfile {
    /// Preferred display name, falling back to the login.
    pub name: String,
    pub login: String,
    pub total_prs: u64,
    /// Meaning depends on `commit_source` and whether private commits were counted.
    pub total_commits: u64,
    /// Open plus closed issues.
    pub total_issues: u64,
    /// Stars over the sampled repository page only.
    pub total_stars: u64,
    pub contributed_to: u64,
    pub followers: u64,
    pub total_repos: u64,
    pub commit_source: CommitSource,
    pub private_commits_counted: bool,
    /// Present when all-time commits were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<AggregateStatus>,
    pub rank: Rank,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yearly_totals_add() {
        let a = YearlyCommitTotals {
            public_count: 3,
            private_count: 1,
        };
        let b = YearlyCommitTotals {
            public_count: 4,
            private_count: 6,
        };

        assert_eq!(
            a + b,
            YearlyCommitTotals {
                public_count: 7,
                private_count: 7
            }
        );
    }

    #[test]
    fn test_degraded_aggregate_is_zeroed() {
        let aggregate = CommitAggregate::degraded(DegradeReason::MalformedHandle);

        assert_eq!(aggregate.total_public_commits, 0);
        assert_eq!(aggregate.total_private_commits, 0);
        assert!(aggregate.is_degraded());
    }

    #[test]
    fn test_degrade_reason_display() {
        let reason = DegradeReason::QueryFailed {
            year: 2020,
            message: "timeout".to_string(),
        };
        assert_eq!(reason.to_string(), "query for 2020 failed: timeout");
    }

    #[test]
    fn test_aggregate_status_serialization() {
        let status = AggregateStatus::Degraded(DegradeReason::MalformedHandle);
        let json = serde_json::to_string(&status).unwrap();

        assert!(json.contains("\"status\":\"degraded\""));
        assert!(json.contains("\"reason\":\"malformed_handle\""));
    }
}
