pub mod config;
pub mod error;
pub mod github;
pub mod metrics;
pub mod querier;
pub mod types;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use config::AppConfig;
use error::ApiError;
use github::GitHubClient;
use querier::StatsQuerier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use types::{RepoId, RepoStatistics};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Query string of the repository endpoints.
#[derive(Debug, Deserialize)]
pub struct RepoQuery {
    pub repo: Option<String>,
}

/// Shared application state accessible to all request handlers.
pub struct AppState {
    /// Service assembling repository statistics.
    pub querier: StatsQuerier,
    /// Client used by the metadata proxy. It never sends the configured token.
    pub proxy_client: GitHubClient,
    /// Application configuration loaded from environment variables.
    pub config: AppConfig,
}

impl AppState {
    /// Initializes the application state, including both GitHub clients.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let querier = StatsQuerier::new(&config)?;
        let proxy_client = GitHubClient::unauthenticated(&config)?;
        Ok(Self {
            querier,
            proxy_client,
            config,
        })
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let static_dir = Path::new(&state.config.static_dir);
    let serve_dir =
        ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/repo", get(get_repo))
        .route("/api/stats", get(get_repo_stats))
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "repostats",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Proxies an unauthenticated repository metadata lookup, returning GitHub's JSON verbatim.
pub async fn get_repo(
    Query(query): Query<RepoQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo_id = RepoId::parse(&required_repo(query)?)?;
    let data = state.proxy_client.repository_raw(&repo_id).await?;

    tracing::debug!(repo_id = %repo_id, "Returning repository metadata");
    Ok(Json(data))
}

pub async fn get_repo_stats(
    Query(query): Query<RepoQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RepoStatistics>, ApiError> {
    let repo_ref = required_repo(query)?;
    let statistics = state.querier.get(&repo_ref).await?;

    tracing::debug!(repo_id = %statistics.repo, "Returning repository statistics");
    Ok(Json(statistics))
}

fn required_repo(query: RepoQuery) -> Result<String, ApiError> {
    query
        .repo
        .filter(|repo| !repo.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Repository name is required".to_string()))
}
