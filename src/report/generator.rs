//! Text and JSON rendering of a statistics profile.

use crate::models::{AggregateStatus, CommitSource, StatisticsProfile};
use anyhow::Result;

/// Generate a human-readable summary.
pub fn generate_text_report(profile: &StatisticsProfile) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}'s GitHub Stats\n", profile.name));
    output.push_str(&format!(
        "Rank: {} (top {:.1}%)\n\n",
        profile.rank.level, profile.rank.score
    ));

    output.push_str(&format!("  Total Stars Earned:  {}\n", profile.total_stars));
    output.push_str(&format!(
        "  Total Commits ({}): {}\n",
        commit_label(profile),
        profile.total_commits
    ));
    output.push_str(&format!("  Total PRs:           {}\n", profile.total_prs));
    output.push_str(&format!("  Total Issues:        {}\n", profile.total_issues));
    output.push_str(&format!("  Contributed to:      {}\n", profile.contributed_to));
    output.push_str(&format!("  Followers:           {}\n", profile.followers));

    if let Some(AggregateStatus::Degraded(reason)) = &profile.history {
        output.push_str(&format!(
            "\n  ⚠️  Commit history unavailable ({}); commits shown as 0\n",
            reason
        ));
    }

    output
}

fn commit_label(profile: &StatisticsProfile) -> String {
    let period = match profile.commit_source {
        CommitSource::CurrentPeriod => "last year".to_string(),
        CommitSource::AllTime => "all time".to_string(),
    };

    if profile.private_commits_counted {
        format!("{}, incl. private", period)
    } else {
        period
    }
}

/// Generate a JSON report.
pub fn generate_json_report(profile: &StatisticsProfile) -> Result<String> {
    serde_json::to_string_pretty(profile).map_err(Into::into)
}
