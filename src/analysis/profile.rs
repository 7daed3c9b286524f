//! Profile assembly.
//!
//! One primary query supplies every metric. When all-time commits are
//! requested, the year-bucket aggregate replaces the current-period commit
//! counts; private commits are then optionally added on top.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::aggregator::{YearBucketAggregator, DEFAULT_YEAR_CONCURRENCY};
use super::rank::RankScorer;
use crate::error::{StatsError, UpstreamErrorKind};
use crate::github::queries::{
    user_stats_variables, UserStats, UserStatsData, MAX_PAGE_SIZE, USER_STATS,
};
use crate::github::QueryExecutor;
use crate::models::{CommitSource, RankInput, StatisticsProfile};

/// Tunables for a profile run.
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Size of the owned-repository sample used for the star total.
    pub repo_page_size: u32,
    /// Maximum per-year requests in flight.
    pub year_concurrency: usize,
    /// Repository names left out of the star total.
    pub excluded_repositories: Vec<String>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            repo_page_size: MAX_PAGE_SIZE,
            year_concurrency: DEFAULT_YEAR_CONCURRENCY,
            excluded_repositories: Vec::new(),
        }
    }
}

/// Builds a [`StatisticsProfile`] for one account per call.
///
/// Holds no per-run state, so one assembler can serve concurrent calls for
/// different accounts.
pub struct ProfileAssembler {
    executor: Arc<dyn QueryExecutor>,
    scorer: Arc<dyn RankScorer>,
    options: StatsOptions,
}

impl ProfileAssembler {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        scorer: Arc<dyn RankScorer>,
        options: StatsOptions,
    ) -> Self {
        Self {
            executor,
            scorer,
            options,
        }
    }

    /// Fetch, aggregate and score the profile of `login`.
    ///
    /// # Errors
    ///
    /// `MissingParameter` for an empty login (nothing is fetched), and
    /// `UpstreamQuery`, `Transport` or `Decode` when the primary query fails.
    /// Commit-history failures never surface here; they zero the history.
    pub async fn assemble(
        &self,
        login: &str,
        count_private: bool,
        include_all_commits: bool,
    ) -> Result<StatisticsProfile, StatsError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(StatsError::MissingParameter("username"));
        }

        info!(
            "Assembling profile for {} (private: {}, all commits: {})",
            login, count_private, include_all_commits
        );

        let user = self.fetch_user(login).await?;
        let contributions = &user.contributions_collection;

        let mut total_commits = contributions.total_commit_contributions;
        let mut private_commits = contributions.restricted_contributions_count;
        let mut commit_source = CommitSource::CurrentPeriod;
        let mut history = None;

        if include_all_commits {
            let aggregate =
                YearBucketAggregator::new(self.executor.clone(), self.options.year_concurrency)
                    .aggregate(login, &contributions.contribution_years)
                    .await;

            if aggregate.is_degraded() {
                warn!("Using zeroed commit history for {}", login);
            }

            // The yearly buckets already include the current period.
            total_commits = aggregate.total_public_commits;
            private_commits = aggregate.total_private_commits;
            commit_source = CommitSource::AllTime;
            history = Some(aggregate.status);
        }

        if count_private {
            total_commits += private_commits;
        }

        let total_issues = user.open_issues.total_count + user.closed_issues.total_count;
        let total_stars = user
            .repositories
            .stars_excluding(&self.options.excluded_repositories);

        let rank = self.scorer.score(&RankInput {
            all_commits: include_all_commits,
            total_commits,
            total_repos: user.repositories.total_count,
            followers: user.followers.total_count,
            contributions: user.repositories_contributed_to.total_count,
            stargazers: total_stars,
            prs: user.pull_requests.total_count,
            issues: total_issues,
        });

        debug!(
            "Profile for {}: {} commits, {} stars, rank {}",
            login, total_commits, total_stars, rank.level
        );

        let name = user
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.login.clone());

        Ok(StatisticsProfile {
            name,
            login: user.login,
            total_prs: user.pull_requests.total_count,
            total_commits,
            total_issues,
            total_stars,
            contributed_to: user.repositories_contributed_to.total_count,
            followers: user.followers.total_count,
            total_repos: user.repositories.total_count,
            commit_source,
            private_commits_counted: count_private,
            history,
            rank,
            fetched_at: Utc::now(),
        })
    }

    /// Run the primary query and unwrap its `user`.
    async fn fetch_user(&self, login: &str) -> Result<UserStats, StatsError> {
        let envelope = self
            .executor
            .execute(
                &USER_STATS,
                user_stats_variables(login, self.options.repo_page_size),
            )
            .await?;

        if envelope.has_errors() {
            let kind = if envelope.is_rate_limited() {
                UpstreamErrorKind::RateLimited
            } else {
                UpstreamErrorKind::UserNotFound
            };
            let message = envelope
                .first_error_message()
                .unwrap_or(StatsError::DEFAULT_UPSTREAM_MESSAGE)
                .to_string();
            warn!("Primary query for {} failed: {}", login, message);
            return Err(StatsError::UpstreamQuery { kind, message });
        }

        let user = match envelope.data {
            Some(data) => serde_json::from_value::<UserStatsData>(data)?.user,
            None => None,
        };

        user.ok_or_else(|| StatsError::UpstreamQuery {
            kind: UpstreamErrorKind::UserNotFound,
            message: StatsError::DEFAULT_UPSTREAM_MESSAGE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::WeightedRank;
    use crate::error::FetchError;
    use crate::github::mock::MockExecutor;
    use crate::github::executor::ResponseEnvelope;
    use crate::models::{AggregateStatus, DegradeReason, Rank};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tokio_test::assert_err;

    /// Records the metrics it was given and returns a fixed rank.
    #[derive(Default)]
    struct RecordingScorer {
        seen: Mutex<Option<RankInput>>,
    }

    impl RankScorer for RecordingScorer {
        fn score(&self, input: &RankInput) -> Rank {
            *self.seen.lock().unwrap() = Some(*input);
            Rank {
                level: "A".to_string(),
                score: 20.0,
            }
        }
    }

    fn user_payload(name: Value, years: &[i32]) -> Value {
        json!({
            "user": {
                "name": name,
                "login": "octocat",
                "contributionsCollection": {
                    "totalCommitContributions": 10,
                    "restrictedContributionsCount": 5,
                    "contributionYears": years
                },
                "repositoriesContributedTo": { "totalCount": 8 },
                "pullRequests": { "totalCount": 42 },
                "openIssues": { "totalCount": 3 },
                "closedIssues": { "totalCount": 7 },
                "followers": { "totalCount": 99 },
                "repositories": {
                    "totalCount": 3,
                    "nodes": [
                        { "name": "popular", "stargazers": { "totalCount": 12 } },
                        { "name": "tool", "stargazers": { "totalCount": 5 } },
                        { "name": "dotfiles", "stargazers": { "totalCount": 0 } }
                    ]
                }
            }
        })
    }

    /// Primary query succeeds; the two years sum to 100 public / 20 private.
    fn healthy_executor() -> Arc<MockExecutor> {
        Arc::new(MockExecutor::new(|query, variables| match query {
            "userInfo" => Ok(ResponseEnvelope::with_data(user_payload(
                json!("The Octocat"),
                &[2021, 2020],
            ))),
            _ => {
                let (public, private) = match &variables["from"].as_str().unwrap()[..4] {
                    "2020" => (60, 5),
                    _ => (40, 15),
                };
                Ok(ResponseEnvelope::with_data(json!({
                    "user": {
                        "contributionsCollection": {
                            "totalCommitContributions": public,
                            "restrictedContributionsCount": private
                        }
                    }
                })))
            }
        }))
    }

    fn assembler(executor: Arc<MockExecutor>) -> ProfileAssembler {
        ProfileAssembler::new(executor, Arc::new(WeightedRank), StatsOptions::default())
    }

    #[tokio::test]
    async fn test_current_period_commits_only() {
        let executor = healthy_executor();
        let profile = assembler(executor.clone())
            .assemble("octocat", false, false)
            .await
            .unwrap();

        assert_eq!(profile.total_commits, 10);
        assert_eq!(profile.commit_source, CommitSource::CurrentPeriod);
        assert_eq!(profile.history, None);
        assert_eq!(executor.calls_to("yearlyCommits"), 0);
    }

    #[tokio::test]
    async fn test_private_commits_added() {
        let profile = assembler(healthy_executor())
            .assemble("octocat", true, false)
            .await
            .unwrap();

        assert_eq!(profile.total_commits, 15);
        assert!(profile.private_commits_counted);
    }

    #[tokio::test]
    async fn test_all_commits_replace_primary_totals() {
        let executor = healthy_executor();
        let profile = assembler(executor.clone())
            .assemble("octocat", false, true)
            .await
            .unwrap();

        assert_eq!(profile.total_commits, 100);
        assert_eq!(profile.commit_source, CommitSource::AllTime);
        assert_eq!(profile.history, Some(AggregateStatus::Complete));
        assert_eq!(executor.calls_to("yearlyCommits"), 2);
    }

    #[tokio::test]
    async fn test_all_commits_with_private() {
        let profile = assembler(healthy_executor())
            .assemble("octocat", true, true)
            .await
            .unwrap();

        assert_eq!(profile.total_commits, 120);
    }

    #[tokio::test]
    async fn test_derived_totals() {
        let profile = assembler(healthy_executor())
            .assemble("octocat", false, false)
            .await
            .unwrap();

        assert_eq!(profile.total_issues, 10);
        assert_eq!(profile.total_stars, 17);
        assert_eq!(profile.total_prs, 42);
        assert_eq!(profile.contributed_to, 8);
        assert_eq!(profile.followers, 99);
        assert_eq!(profile.total_repos, 3);
        assert_eq!(profile.name, "The Octocat");
    }

    #[tokio::test]
    async fn test_scorer_receives_all_metrics() {
        let scorer = Arc::new(RecordingScorer::default());
        let assembler = ProfileAssembler::new(
            healthy_executor(),
            scorer.clone(),
            StatsOptions::default(),
        );

        let profile = assembler.assemble("octocat", true, false).await.unwrap();

        assert_eq!(
            *scorer.seen.lock().unwrap(),
            Some(RankInput {
                all_commits: false,
                total_commits: 15,
                total_repos: 3,
                followers: 99,
                contributions: 8,
                stargazers: 17,
                prs: 42,
                issues: 10,
            })
        );
        assert_eq!(profile.rank.level, "A");
    }

    #[tokio::test]
    async fn test_name_falls_back_to_login() {
        let executor = Arc::new(MockExecutor::new(|_, _| {
            Ok(ResponseEnvelope::with_data(user_payload(Value::Null, &[])))
        }));
        let profile = assembler(executor)
            .assemble("octocat", false, false)
            .await
            .unwrap();

        assert_eq!(profile.name, "octocat");
    }

    #[tokio::test]
    async fn test_excluded_repositories_skip_stars() {
        let options = StatsOptions {
            excluded_repositories: vec!["popular".to_string()],
            ..StatsOptions::default()
        };
        let assembler = ProfileAssembler::new(healthy_executor(), Arc::new(WeightedRank), options);

        let profile = assembler.assemble("octocat", false, false).await.unwrap();
        assert_eq!(profile.total_stars, 5);
    }

    #[tokio::test]
    async fn test_repo_page_size_is_sent() {
        let executor = healthy_executor();
        let options = StatsOptions {
            repo_page_size: 30,
            ..StatsOptions::default()
        };
        ProfileAssembler::new(executor.clone(), Arc::new(WeightedRank), options)
            .assemble("octocat", false, false)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0].variables["first"], 30);
        assert_eq!(calls[0].variables["login"], "octocat");
    }

    #[tokio::test]
    async fn test_missing_login_issues_no_calls() {
        let executor = healthy_executor();
        let assembler = assembler(executor.clone());

        for login in ["", "   "] {
            let err = assert_err!(assembler.assemble(login, true, true).await);
            assert!(matches!(err, StatsError::MissingParameter("username")));
        }
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_aborts_before_history() {
        let executor = Arc::new(MockExecutor::new(|_, _| {
            Ok(ResponseEnvelope::with_error(
                "Could not resolve to a User with the login of 'ghost-user'.",
                Some("NOT_FOUND"),
            ))
        }));

        let err = assert_err!(
            assembler(executor.clone())
                .assemble("ghost-user", true, true)
                .await
        );

        assert!(err.is_not_found());
        assert!(err.to_string().contains("Could not resolve to a User"));
        assert_eq!(executor.calls_to("yearlyCommits"), 0);
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_default_message() {
        let executor = Arc::new(MockExecutor::new(|_, _| {
            Ok(ResponseEnvelope::with_error("", None))
        }));

        let err = assert_err!(assembler(executor).assemble("octocat", false, false).await);
        assert_eq!(err.to_string(), StatsError::DEFAULT_UPSTREAM_MESSAGE);
    }

    #[tokio::test]
    async fn test_rate_limited_classification() {
        let executor = Arc::new(MockExecutor::new(|_, _| {
            Ok(ResponseEnvelope::with_error(
                "API rate limit exceeded",
                Some("RATE_LIMITED"),
            ))
        }));

        let err = assert_err!(assembler(executor).assemble("octocat", false, false).await);
        assert!(matches!(
            err,
            StatsError::UpstreamQuery {
                kind: UpstreamErrorKind::RateLimited,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_null_user_is_not_found() {
        let executor = Arc::new(MockExecutor::new(|_, _| {
            Ok(ResponseEnvelope::with_data(json!({ "user": null })))
        }));

        let err = assert_err!(assembler(executor).assemble("octocat", false, true).await);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let executor = Arc::new(MockExecutor::new(|_, _| Err(FetchError::RateLimited)));

        let err = assert_err!(assembler(executor).assemble("octocat", false, true).await);
        assert!(matches!(err, StatsError::Transport(FetchError::RateLimited)));
    }

    #[tokio::test]
    async fn test_history_failure_degrades_to_zero() {
        let executor = Arc::new(MockExecutor::new(|query, _| match query {
            "userInfo" => Ok(ResponseEnvelope::with_data(user_payload(
                json!("The Octocat"),
                &[2021, 2020],
            ))),
            _ => Err(FetchError::Http("timed out".to_string())),
        }));

        let profile = assembler(executor)
            .assemble("octocat", true, true)
            .await
            .unwrap();

        assert_eq!(profile.total_commits, 0);
        assert_eq!(profile.commit_source, CommitSource::AllTime);
        assert!(matches!(
            profile.history,
            Some(AggregateStatus::Degraded(DegradeReason::QueryFailed { .. }))
        ));
        assert_eq!(profile.total_stars, 17);
    }

    #[tokio::test]
    async fn test_concurrent_assembly_for_different_accounts() {
        let executor = Arc::new(MockExecutor::new(|_, variables| {
            let login = variables["login"].as_str().unwrap_or_default().to_string();
            let mut payload = user_payload(json!(login.clone()), &[]);
            payload["user"]["login"] = json!(login);
            Ok(ResponseEnvelope::with_data(payload))
        }));
        let assembler = assembler(executor);

        let (a, b) = tokio::join!(
            assembler.assemble("alice", false, false),
            assembler.assemble("bob", false, false)
        );

        assert_eq!(a.unwrap().login, "alice");
        assert_eq!(b.unwrap().login, "bob");
    }
}
