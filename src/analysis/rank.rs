//! Rank scoring.
//!
//! Turns the seven profile metrics into a percentile and a tier label.
//! Each metric is squashed through a cumulative distribution function
//! around a typical value, then the weighted mean is inverted into a
//! "top N%" percentile.

use crate::models::{Rank, RankInput};

/// Scores an assembled profile.
pub trait RankScorer: Send + Sync {
    fn score(&self, input: &RankInput) -> Rank;
}

const THRESHOLDS: [f64; 9] = [1.0, 12.5, 25.0, 37.5, 50.0, 62.5, 75.0, 87.5, 100.0];
const LEVELS: [&str; 9] = ["S", "A+", "A", "A-", "B+", "B", "B-", "C+", "C"];

/// Default scorer: weighted mix of per-metric distributions.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRank;

impl WeightedRank {
    const COMMITS_MEDIAN: f64 = 250.0;
    const ALL_COMMITS_MEDIAN: f64 = 1000.0;
    const COMMITS_WEIGHT: f64 = 2.0;
    const PRS_MEDIAN: f64 = 50.0;
    const PRS_WEIGHT: f64 = 3.0;
    const ISSUES_MEDIAN: f64 = 25.0;
    const ISSUES_WEIGHT: f64 = 1.0;
    const CONTRIBUTIONS_MEDIAN: f64 = 10.0;
    const CONTRIBUTIONS_WEIGHT: f64 = 1.0;
    const STARS_MEDIAN: f64 = 50.0;
    const STARS_WEIGHT: f64 = 4.0;
    const FOLLOWERS_MEDIAN: f64 = 10.0;
    const FOLLOWERS_WEIGHT: f64 = 1.0;
    const REPOS_MEDIAN: f64 = 20.0;
    const REPOS_WEIGHT: f64 = 1.0;

    /// Percentile in `[0, 100]`; lower is better.
    pub fn percentile(input: &RankInput) -> f64 {
        let commits_median = if input.all_commits {
            Self::ALL_COMMITS_MEDIAN
        } else {
            Self::COMMITS_MEDIAN
        };

        let parts = [
            (
                Self::COMMITS_WEIGHT,
                exponential_cdf(input.total_commits as f64 / commits_median),
            ),
            (
                Self::PRS_WEIGHT,
                exponential_cdf(input.prs as f64 / Self::PRS_MEDIAN),
            ),
            (
                Self::ISSUES_WEIGHT,
                exponential_cdf(input.issues as f64 / Self::ISSUES_MEDIAN),
            ),
            (
                Self::CONTRIBUTIONS_WEIGHT,
                exponential_cdf(input.contributions as f64 / Self::CONTRIBUTIONS_MEDIAN),
            ),
            (
                Self::STARS_WEIGHT,
                log_normal_cdf(input.stargazers as f64 / Self::STARS_MEDIAN),
            ),
            (
                Self::FOLLOWERS_WEIGHT,
                log_normal_cdf(input.followers as f64 / Self::FOLLOWERS_MEDIAN),
            ),
            (
                Self::REPOS_WEIGHT,
                log_normal_cdf(input.total_repos as f64 / Self::REPOS_MEDIAN),
            ),
        ];

        let total_weight: f64 = parts.iter().map(|(w, _)| w).sum();
        let weighted: f64 = parts.iter().map(|(w, cdf)| w * cdf).sum::<f64>() / total_weight;

        ((1.0 - weighted) * 100.0).clamp(0.0, 100.0)
    }
}

impl RankScorer for WeightedRank {
    fn score(&self, input: &RankInput) -> Rank {
        let percentile = Self::percentile(input);
        let level = THRESHOLDS
            .iter()
            .position(|t| percentile <= *t)
            .map_or("C", |i| LEVELS[i]);

        Rank {
            level: level.to_string(),
            score: percentile,
        }
    }
}

fn exponential_cdf(x: f64) -> f64 {
    1.0 - 2f64.powf(-x)
}

fn log_normal_cdf(x: f64) -> f64 {
    x / (1.0 + x)
}
