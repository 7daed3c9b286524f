//! GraphQL documents and response shapes.

use chrono::{NaiveDate, SecondsFormat};
use serde::Deserialize;
use serde_json::{json, Value};

use super::executor::GraphQlQuery;

/// Largest page GitHub serves for a connection.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Everything the profile needs in one round trip.
pub const USER_STATS: GraphQlQuery = GraphQlQuery {
    name: "userInfo",
    document: r#"
query userInfo($login: String!, $first: Int!) {
  user(login: $login) {
    name
    login
    contributionsCollection {
      totalCommitContributions
      restrictedContributionsCount
      contributionYears
    }
    repositoriesContributedTo(first: 1, contributionTypes: [COMMIT, ISSUE, PULL_REQUEST, REPOSITORY]) {
      totalCount
    }
    pullRequests(first: 1) {
      totalCount
    }
    openIssues: issues(states: OPEN) {
      totalCount
    }
    closedIssues: issues(states: CLOSED) {
      totalCount
    }
    followers {
      totalCount
    }
    repositories(first: $first, ownerAffiliations: OWNER, orderBy: {direction: DESC, field: STARGAZERS}) {
      totalCount
      nodes {
        name
        stargazers {
          totalCount
        }
      }
    }
  }
}
"#,
};

/// Commit totals for the contribution period starting at `$from`.
pub const YEARLY_COMMITS: GraphQlQuery = GraphQlQuery {
    name: "yearlyCommits",
    document: r#"
query yearlyCommits($login: String!, $from: DateTime) {
  user(login: $login) {
    contributionsCollection(from: $from) {
      totalCommitContributions
      restrictedContributionsCount
    }
  }
}
"#,
};

#[derive(Debug, Clone, Deserialize)]
pub struct TotalCount {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    pub total_commit_contributions: u64,
    pub restricted_contributions_count: u64,
    #[serde(default)]
    pub contribution_years: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryNode {
    #[serde(default)]
    pub name: String,
    pub stargazers: TotalCount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPage {
    pub total_count: u64,
    #[serde(default)]
    pub nodes: Vec<Option<RepositoryNode>>,
}

impl RepositoryPage {
    /// Sum of stargazers over this page, skipping excluded repository names.
    pub fn stars_excluding(&self, excluded: &[String]) -> u64 {
        self.nodes
            .iter()
            .flatten()
            .filter(|repo| !excluded.iter().any(|name| name == &repo.name))
            .map(|repo| repo.stargazers.total_count)
            .sum()
    }
}

/// `user` payload of [`USER_STATS`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub name: Option<String>,
    pub login: String,
    pub contributions_collection: ContributionsCollection,
    pub repositories_contributed_to: TotalCount,
    pub pull_requests: TotalCount,
    pub open_issues: TotalCount,
    pub closed_issues: TotalCount,
    pub followers: TotalCount,
    pub repositories: RepositoryPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserStatsData {
    pub user: Option<UserStats>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyUser {
    pub contributions_collection: ContributionsCollection,
}

/// Data payload of [`YEARLY_COMMITS`].
#[derive(Debug, Clone, Deserialize)]
pub struct YearlyCommitsData {
    pub user: Option<YearlyUser>,
}

pub fn user_stats_variables(login: &str, page_size: u32) -> Value {
    json!({ "login": login, "first": page_size.clamp(1, MAX_PAGE_SIZE) })
}

/// Start of a contribution year as an RFC 3339 UTC timestamp.
pub fn period_start(year: i32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn yearly_commits_variables(login: &str, from: &str) -> Value {
    json!({ "login": login, "from": from })
}
