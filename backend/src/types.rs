use crate::error::InvalidRepoReference;
use crate::metrics::{
    ComplexityEntry, ContributorEntry, HeatmapDay, LanguageShare, PullRequestSummary,
    TimeSeriesPoint,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The owner of the repository (e.g., "facebook").
    pub owner: String,
    /// The name of the repository (e.g., "react").
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl RepoId {
    /// Parses a repository URL or `owner/name` pair, keeping the last two path segments.
    pub fn parse(input: &str) -> Result<Self, InvalidRepoReference> {
        let invalid = |reason| InvalidRepoReference {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let without_suffix = trimmed.split(['?', '#']).next().unwrap_or_default();

        // Drop the scheme and host of a full URL.
        let path = match without_suffix.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
            None => without_suffix,
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let &[.., owner, repo] = segments.as_slice() else {
            return Err(invalid("expected an owner and a repository name"));
        };

        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        if !is_valid_segment(owner) || !is_valid_segment(repo) {
            return Err(invalid(
                "owner and name may only contain letters, digits, '.', '-' and '_'",
            ));
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl FromStr for RepoId {
    type Err = InvalidRepoReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Snapshot of everything derived for one repository in one aggregation cycle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepoStatistics {
    pub repo: RepoId,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub languages: Vec<LanguageShare>,
    pub contributors: Vec<ContributorEntry>,
    pub stars_over_time: Vec<TimeSeriesPoint>,
    pub forks_over_time: Vec<TimeSeriesPoint>,
    pub contribution_heatmap: Vec<HeatmapDay>,
    pub code_complexity: Vec<ComplexityEntry>,
    pub pull_requests: PullRequestSummary,
    pub fetched_at: DateTime<Utc>,
}
