//! Thin adapter over the GitHub REST API.
//!
//! Octocrab provides the transport, authentication and base URI handling. Responses are read
//! raw so that status codes, `202 Accepted` answers from the statistics endpoints and `Link`
//! pagination headers are handled here rather than hidden behind typed handlers.

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::types::RepoId;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderValue, ACCEPT, LINK};
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const PER_PAGE: u32 = 100;
const STAR_MEDIA_TYPE: &str = "application/vnd.github.star+json";
const DELETED_USER_LOGIN: &str = "ghost";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Repository {
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Author {
    pub login: String,
}

/// One entry of `/stats/contributors`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContributorStats {
    /// `None` for accounts that have since been deleted.
    pub author: Option<Author>,
    pub total: u64,
}

impl ContributorStats {
    pub fn login(&self) -> &str {
        self.author
            .as_ref()
            .map_or(DELETED_USER_LOGIN, |author| author.login.as_str())
    }
}

/// One entry of `/stats/commit_activity`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeeklyCommitActivity {
    /// Start of the week, in seconds since the Unix epoch.
    pub week: i64,
    /// Commit counts from Sunday to Saturday.
    pub days: [u64; 7],
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// Decodes the base64 payload GitHub returns for a file into UTF-8 text.
    pub fn decode(&self) -> Result<String, FetchError> {
        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != "base64" {
                return Err(FetchError::Decode(format!(
                    "unsupported content encoding '{encoding}'"
                )));
            }
        }

        // GitHub wraps the payload every 60 characters.
        let cleaned: String = self
            .content
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let bytes = STANDARD
            .decode(cleaned)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: PullRequestState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// A stargazer as returned with the `star+json` media type.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Stargazer {
    #[serde(default)]
    pub starred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Fork {
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

struct RawResponse {
    status: u16,
    next: Option<String>,
    body: String,
}

#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    /// Builds a client authenticated with the configured token, if any.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Self::build(&config.github_api_url, config.github_token.clone())
    }

    /// Builds a client that never sends credentials.
    pub fn unauthenticated(config: &AppConfig) -> anyhow::Result<Self> {
        Self::build(&config.github_api_url, None)
    }

    fn build(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let mut builder = Octocrab::builder()
            .base_uri(base_url)?
            .add_retry_config(RetryConfig::None);
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    pub async fn repository(&self, repo_id: &RepoId) -> Result<Repository, FetchError> {
        let response = self.get_raw(&repo_route(repo_id, ""), None).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Repository metadata exactly as GitHub returned it.
    pub async fn repository_raw(&self, repo_id: &RepoId) -> Result<serde_json::Value, FetchError> {
        let response = self.get_raw(&repo_route(repo_id, ""), None).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Language byte counts, in the order GitHub reports them.
    pub async fn languages(&self, repo_id: &RepoId) -> Result<Vec<(String, u64)>, FetchError> {
        let response = self
            .get_raw(&repo_route(repo_id, "/languages"), None)
            .await?;
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&response.body)?;

        Ok(map
            .into_iter()
            .filter_map(|(name, bytes)| bytes.as_u64().map(|bytes| (name, bytes)))
            .collect())
    }

    /// Returns `None` while GitHub is still computing the statistics.
    pub async fn contributor_stats(
        &self,
        repo_id: &RepoId,
    ) -> Result<Option<Vec<ContributorStats>>, FetchError> {
        self.get_stats(&repo_route(repo_id, "/stats/contributors"))
            .await
    }

    /// Last 52 weeks of commit counts. Returns `None` while GitHub is still computing them.
    pub async fn commit_activity(
        &self,
        repo_id: &RepoId,
    ) -> Result<Option<Vec<WeeklyCommitActivity>>, FetchError> {
        self.get_stats(&repo_route(repo_id, "/stats/commit_activity"))
            .await
    }

    /// Lists a directory. An empty `path` lists the repository root.
    pub async fn contents(
        &self,
        repo_id: &RepoId,
        path: &str,
    ) -> Result<Vec<ContentEntry>, FetchError> {
        let response = self.get_raw(&contents_route(repo_id, path), None).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    pub async fn file_content(&self, repo_id: &RepoId, path: &str) -> Result<String, FetchError> {
        let response = self.get_raw(&contents_route(repo_id, path), None).await?;
        let file: FileContent = serde_json::from_str(&response.body)?;
        file.decode()
    }

    /// Pull requests in any state, newest first, reading at most `max_pages` pages.
    pub async fn pull_requests(
        &self,
        repo_id: &RepoId,
        max_pages: u32,
    ) -> Result<Vec<PullRequest>, FetchError> {
        let route = repo_route(
            repo_id,
            &format!("/pulls?state=all&per_page={PER_PAGE}&page=1"),
        );
        self.paginate(route, None, Some(max_pages)).await
    }

    /// Every stargazer with the time they starred the repository.
    pub async fn stargazers(&self, repo_id: &RepoId) -> Result<Vec<Stargazer>, FetchError> {
        let route = repo_route(repo_id, &format!("/stargazers?per_page={PER_PAGE}&page=1"));
        self.paginate(route, Some(STAR_MEDIA_TYPE), None).await
    }

    pub async fn forks(&self, repo_id: &RepoId) -> Result<Vec<Fork>, FetchError> {
        let route = repo_route(repo_id, &format!("/forks?per_page={PER_PAGE}&page=1"));
        self.paginate(route, None, None).await
    }

    async fn get_stats<T: DeserializeOwned>(
        &self,
        route: &str,
    ) -> Result<Option<Vec<T>>, FetchError> {
        let response = self.get_raw(route, None).await?;

        if response.status == 202 || response.status == 204 || response.body.trim().is_empty() {
            tracing::debug!(route, status = response.status, "Statistics not ready yet");
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&response.body)?))
    }

    /// Follows `rel="next"` links until GitHub stops sending them or `max_pages` is reached.
    async fn paginate<T: DeserializeOwned>(
        &self,
        first: String,
        accept: Option<&'static str>,
        max_pages: Option<u32>,
    ) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(uri) = next.take() {
            let response = self.get_raw(&uri, accept).await?;
            let page: Vec<T> = serde_json::from_str(&response.body)?;
            items.extend(page);
            pages += 1;

            if max_pages.is_some_and(|max| pages >= max) {
                if response.next.is_some() {
                    tracing::debug!(pages, "Page limit reached, remaining pages skipped");
                }
                break;
            }

            next = response.next;
        }

        Ok(items)
    }

    async fn get_raw(
        &self,
        uri: &str,
        accept: Option<&'static str>,
    ) -> Result<RawResponse, FetchError> {
        tracing::debug!(uri, "GitHub request");

        let headers = accept.map(|media_type| {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static(media_type));
            headers
        });

        let response = self.octocrab._get_with_headers(uri, headers).await?;
        let status = response.status();
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_url);
        let body = self.octocrab.body_to_string(response).await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            next,
            body,
        })
    }
}

fn repo_route(repo_id: &RepoId, suffix: &str) -> String {
    format!("/repos/{}/{}{}", repo_id.owner, repo_id.repo, suffix)
}

fn contents_route(repo_id: &RepoId, path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();

    if encoded.is_empty() {
        repo_route(repo_id, "/contents")
    } else {
        repo_route(repo_id, &format!("/contents/{}", encoded.join("/")))
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|error| error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
