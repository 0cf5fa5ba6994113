//! Service layer assembling repository statistics.
//!
//! This module implements `StatsQuerier`, the main entry point for producing a
//! `RepoStatistics` snapshot. For each request it:
//! 1. Parses the repository reference, before any network call.
//! 2. Fetches metadata, languages, contributor stats, commit activity, the root listing and
//!    pull requests concurrently.
//! 3. Fetches star history, fork history and the files scored for complexity concurrently.
//! 4. Derives every chart section, downgrading failed sections to their empty default.
//!
//! Only a failure of the metadata lookup aborts the request.

use crate::config::AppConfig;
use crate::error::AggregationError;
use crate::github::{ContentEntry, ContentKind, GitHubClient};
use crate::metrics::{self, ComplexityEntry, TimeSeriesPoint};
use crate::types::{RepoId, RepoStatistics};
use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt};
use std::fmt;

/// Outcome of one non-mandatory section of the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived<T> {
    Value(T),
    Degraded {
        section: &'static str,
        reason: String,
    },
}

impl<T> Derived<T> {
    pub fn from_result<E: fmt::Display>(section: &'static str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Derived::Value(value),
            Err(e) => Derived::Degraded {
                section,
                reason: e.to_string(),
            },
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Derived<U> {
        match self {
            Derived::Value(value) => Derived::Value(f(value)),
            Derived::Degraded { section, reason } => Derived::Degraded { section, reason },
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Derived::Value(value) => Some(value),
            Derived::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Derived::Degraded { .. })
    }
}

/// Resolves sections to their values, substituting defaults for degraded ones.
///
/// Every section is resolved independently; a degraded section never affects the others.
struct Sections<'a> {
    repo_id: &'a RepoId,
    degraded: Vec<&'static str>,
}

impl<'a> Sections<'a> {
    fn new(repo_id: &'a RepoId) -> Self {
        Self {
            repo_id,
            degraded: Vec::new(),
        }
    }

    fn take<T: Default>(&mut self, derived: Derived<T>) -> T {
        match derived {
            Derived::Value(value) => value,
            Derived::Degraded { section, reason } => {
                tracing::warn!(
                    repo_id = %self.repo_id,
                    section,
                    reason = %reason,
                    "Section failed, using empty default"
                );
                self.degraded.push(section);
                T::default()
            }
        }
    }
}

#[derive(Clone)]
pub struct StatsQuerier {
    client: GitHubClient,
    config: AppConfig,
}

impl StatsQuerier {
    /// Initializes a new StatsQuerier with an authenticated GitHub client.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self::with_client(GitHubClient::new(config)?, config))
    }

    pub fn with_client(client: GitHubClient, config: &AppConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Builds a fresh statistics snapshot for a repository URL or `owner/name` reference.
    pub async fn get(&self, repo_ref: &str) -> Result<RepoStatistics, AggregationError> {
        let repo_id = RepoId::parse(repo_ref)?;
        self.aggregate(&repo_id).await
    }

    async fn aggregate(&self, repo_id: &RepoId) -> Result<RepoStatistics, AggregationError> {
        tracing::info!(repo_id = %repo_id, "Aggregating repository statistics");
        let client = &self.client;

        let (repository, languages, contributors, activity, contents, pulls) = tokio::join!(
            client.repository(repo_id),
            client.languages(repo_id),
            client.contributor_stats(repo_id),
            client.commit_activity(repo_id),
            client.contents(repo_id, ""),
            client.pull_requests(repo_id, self.config.max_pull_request_pages),
        );

        let repository = repository
            .map_err(|e| AggregationError::from_metadata_failure(&repo_id.to_string(), e))?;

        let contents = Derived::from_result("contents", contents);
        let listing = contents.value().map(Vec::as_slice).unwrap_or_default();

        let (stars_over_time, forks_over_time, code_complexity) = tokio::join!(
            self.stars_over_time(repo_id),
            self.forks_over_time(repo_id),
            self.code_complexity(repo_id, listing),
        );

        let mut sections = Sections::new(repo_id);
        let statistics = RepoStatistics {
            repo: repo_id.clone(),
            full_name: repository.full_name,
            description: repository.description,
            html_url: repository.html_url,
            stars: repository.stargazers_count,
            forks: repository.forks_count,
            open_issues: repository.open_issues_count,
            languages: sections.take(
                Derived::from_result("languages", languages)
                    .map(|languages| metrics::language_breakdown(&languages)),
            ),
            contributors: sections.take(
                Derived::from_result("contributors", contributors)
                    .map(|stats| metrics::top_contributors(stats.as_deref())),
            ),
            stars_over_time: sections.take(stars_over_time),
            forks_over_time: sections.take(forks_over_time),
            contribution_heatmap: sections.take(
                Derived::from_result("contribution_heatmap", activity)
                    .map(|weeks| metrics::contribution_heatmap(weeks.as_deref())),
            ),
            code_complexity: sections.take(contents.map(|_| code_complexity)),
            pull_requests: sections.take(
                Derived::from_result("pull_requests", pulls)
                    .map(|prs| metrics::pull_request_summary(&prs)),
            ),
            fetched_at: Utc::now(),
        };

        tracing::info!(
            repo_id = %repo_id,
            degraded = ?sections.degraded,
            "Repository statistics ready"
        );

        Ok(statistics)
    }

    async fn stars_over_time(&self, repo_id: &RepoId) -> Derived<Vec<TimeSeriesPoint>> {
        Derived::from_result("stars_over_time", self.client.stargazers(repo_id).await).map(
            |stargazers| {
                metrics::events_over_time(stargazers.into_iter().filter_map(|s| s.starred_at))
            },
        )
    }

    async fn forks_over_time(&self, repo_id: &RepoId) -> Derived<Vec<TimeSeriesPoint>> {
        Derived::from_result("forks_over_time", self.client.forks(repo_id).await)
            .map(|forks| metrics::events_over_time(forks.into_iter().map(|f| f.created_at)))
    }

    /// Scores every source file of a directory listing. Files that cannot be fetched or
    /// decoded are left out.
    async fn code_complexity(
        &self,
        repo_id: &RepoId,
        listing: &[ContentEntry],
    ) -> Vec<ComplexityEntry> {
        let files: Vec<ContentEntry> = listing
            .iter()
            .filter(|entry| entry.kind == ContentKind::File && metrics::is_source_file(&entry.name))
            .cloned()
            .collect();

        let client = self.client.clone();
        let repo_id = repo_id.clone();
        let scored: Vec<ComplexityEntry> = stream::iter(files)
            .map(move |entry| {
                let client = client.clone();
                let repo_id = repo_id.clone();
                async move {
                    match client.file_content(&repo_id, &entry.path).await {
                        Ok(text) => Some(ComplexityEntry {
                            score: metrics::complexity_score(&text),
                            file_name: entry.name,
                            path: entry.path,
                        }),
                        Err(e) => {
                            tracing::warn!(
                                repo_id = %repo_id,
                                path = %entry.path,
                                error = %e,
                                "Skipping file in complexity analysis"
                            );
                            None
                        }
                    }
                }
            })
            // `buffered` keeps listing order so equal scores rank deterministically.
            .buffered(self.config.file_fetch_concurrency.max(1))
            .filter_map(future::ready)
            .collect()
            .await;

        metrics::top_complexity(scored)
    }
}
