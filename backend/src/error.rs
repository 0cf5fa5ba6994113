//! Error types for each layer of the service:
//! - `FetchError`: a single GitHub API call failed
//! - `AggregationError`: a statistics request could not produce a snapshot
//! - `ApiError`: what the HTTP handlers turn into `{error}` responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User input that does not name a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid repository reference '{input}': {reason}")]
pub struct InvalidRepoReference {
    pub input: String,
    pub reason: &'static str,
}

/// Failure of one outbound call to the GitHub API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] octocrab::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status GitHub answered with, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Fatal failure of a statistics aggregation.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(transparent)]
    InvalidRepoReference(#[from] InvalidRepoReference),

    #[error("Repository not found: {0}")]
    UpstreamNotFound(String),

    #[error("Access to repository denied: {0}")]
    UpstreamUnauthorized(String),

    #[error("Upstream error: {0}")]
    Upstream(FetchError),
}

impl AggregationError {
    /// Classifies a failure of the mandatory metadata lookup.
    pub fn from_metadata_failure(repo: &str, err: FetchError) -> Self {
        match err.status() {
            Some(404) => AggregationError::UpstreamNotFound(repo.to_string()),
            Some(401) | Some(403) => AggregationError::UpstreamUnauthorized(repo.to_string()),
            _ => AggregationError::Upstream(err),
        }
    }
}

/// Message shown to users for every fatal aggregation failure.
pub const STATS_FAILURE_MESSAGE: &str = "Failed to fetch repository statistics";

/// Message shown to users when the repository metadata proxy fails.
pub const PROXY_FAILURE_MESSAGE: &str = "Failed to fetch repository data";

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] FetchError),
}

impl From<InvalidRepoReference> for ApiError {
    fn from(e: InvalidRepoReference) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Aggregation(AggregationError::InvalidRepoReference(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Aggregation(e) => {
                tracing::error!(error = %e, "Statistics aggregation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    STATS_FAILURE_MESSAGE.to_string(),
                )
            }
            ApiError::Proxy(e) => {
                tracing::error!(error = %e, "Repository lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    PROXY_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
