//! Pure functions turning raw GitHub payloads into chart-ready shapes.

use crate::github::{ContributorStats, PullRequest, PullRequestState, WeeklyCommitActivity};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const TOP_CONTRIBUTORS: usize = 5;
const TOP_COMPLEX_FILES: usize = 10;
const SECONDS_PER_DAY: i64 = 86_400;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Extensions of files the complexity heuristic is applied to.
const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "rs", "go", "java", "kt", "swift", "rb", "php",
    "c", "h", "cpp", "hpp", "cs",
];

static CONTROL_FLOW_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|for|while|switch|catch)\b").expect("valid regex"));

static FUNCTION_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:function|fn|def|func)\b").expect("valid regex"));

/// Share of the repository's code written in one language.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    /// Percentage of the total byte count, in [0, 100].
    pub percentage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContributorEntry {
    pub author: String,
    pub commits: u64,
}

/// One day of a stars or forks history.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TimeSeriesPoint {
    /// UTC calendar date (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Events on this date.
    pub count: u64,
    /// Events on or before this date.
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ComplexityEntry {
    pub file_name: String,
    pub path: String,
    pub score: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PullRequestSummary {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    /// PRs closed by merging. A subset of `closed`.
    pub merged: usize,
    /// Mean time from creation to close over closed PRs, 0 when there are none.
    pub average_merge_time_hours: f64,
}

/// Converts language byte counts into percentages, keeping the input order.
///
/// Returns an empty list when no bytes are reported at all.
pub fn language_breakdown(languages: &[(String, u64)]) -> Vec<LanguageShare> {
    let total: u64 = languages.iter().map(|(_, bytes)| bytes).sum();
    if total == 0 {
        return Vec::new();
    }

    languages
        .iter()
        .map(|(name, bytes)| LanguageShare {
            name: name.clone(),
            percentage: *bytes as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// Ranks contributors by total commits, keeping API order for ties.
pub fn top_contributors(stats: Option<&[ContributorStats]>) -> Vec<ContributorEntry> {
    let Some(stats) = stats else {
        return Vec::new();
    };

    let mut ranked: Vec<&ContributorStats> = stats.iter().collect();
    // `sort_by` is stable, so equal totals keep their relative order.
    ranked.sort_by(|a, b| b.total.cmp(&a.total));

    ranked
        .into_iter()
        .take(TOP_CONTRIBUTORS)
        .map(|c| ContributorEntry {
            author: c.login().to_string(),
            commits: c.total,
        })
        .collect()
}

/// Expands weekly commit buckets into one entry per day.
pub fn contribution_heatmap(weeks: Option<&[WeeklyCommitActivity]>) -> Vec<HeatmapDay> {
    weeks
        .unwrap_or_default()
        .iter()
        .flat_map(|week| {
            week.days.iter().enumerate().filter_map(move |(i, &count)| {
                let seconds = week.week + i as i64 * SECONDS_PER_DAY;
                let date = DateTime::<Utc>::from_timestamp(seconds, 0)?.date_naive();
                Some(HeatmapDay { date, count })
            })
        })
        .collect()
}

/// Buckets event timestamps into per-day counts with a running total, oldest first.
pub fn events_over_time<I>(timestamps: I) -> Vec<TimeSeriesPoint>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for ts in timestamps {
        *per_day.entry(ts.date_naive()).or_default() += 1;
    }

    let mut total = 0;
    per_day
        .into_iter()
        .map(|(date, count)| {
            total += count;
            TimeSeriesPoint { date, count, total }
        })
        .collect()
}

/// Whether a file name carries a source extension the complexity heuristic understands.
pub fn is_source_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Counts control-flow keywords plus function-declaration keywords in source text.
///
/// Keywords only count as whole words: `before` is not a `for` and `iffy` is not an `if`.
pub fn complexity_score(code: &str) -> u64 {
    let control_flow = CONTROL_FLOW_KEYWORDS.find_iter(code).count();
    let functions = FUNCTION_KEYWORDS.find_iter(code).count();
    (control_flow + functions) as u64
}

/// Keeps the most complex files, highest score first, ties in input order.
pub fn top_complexity(mut entries: Vec<ComplexityEntry>) -> Vec<ComplexityEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(TOP_COMPLEX_FILES);
    entries
}

/// Summarizes pull request states and the average time to close.
pub fn pull_request_summary(prs: &[PullRequest]) -> PullRequestSummary {
    let open = prs
        .iter()
        .filter(|pr| pr.state == PullRequestState::Open)
        .count();
    let closed = prs
        .iter()
        .filter(|pr| pr.state == PullRequestState::Closed)
        .count();
    let merged = prs.iter().filter(|pr| pr.merged_at.is_some()).count();

    PullRequestSummary {
        total: prs.len(),
        open,
        closed,
        merged,
        average_merge_time_hours: average_merge_time_hours(prs),
    }
}

fn average_merge_time_hours(prs: &[PullRequest]) -> f64 {
    let durations: Vec<i64> = prs
        .iter()
        .filter(|pr| pr.state == PullRequestState::Closed)
        .filter_map(|pr| pr.closed_at.map(|closed_at| closed_at - pr.created_at))
        // Clock skew in imported PRs can put the close before the creation.
        .map(|elapsed| elapsed.num_milliseconds().max(0))
        .collect();

    if durations.is_empty() {
        return 0.0;
    }

    let total_ms: i64 = durations.iter().sum();
    total_ms as f64 / durations.len() as f64 / MILLIS_PER_HOUR
}
