//! Error types for the profile pipeline.

use thiserror::Error;

/// Failure of a single GraphQL request, after retries.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status that was not retried or ran out of retries.
    #[error("GitHub API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Every configured token hit the rate limit.
    #[error("GitHub API rate limit exceeded for all configured tokens")]
    RateLimited,

    /// Every configured token was rejected.
    #[error("GitHub rejected all configured tokens (bad credentials)")]
    BadCredentials,

    /// The response body was not a GraphQL envelope.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("No GitHub token configured")]
    NoTokens,
}

/// Classification of an error payload returned by the primary query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    UserNotFound,
    RateLimited,
}

/// Errors surfaced by [`crate::analysis::ProfileAssembler`].
#[derive(Error, Debug)]
pub enum StatsError {
    /// A required input was absent or empty. No request was issued.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The primary query answered with an error payload.
    #[error("{message}")]
    UpstreamQuery {
        kind: UpstreamErrorKind,
        message: String,
    },

    /// The primary query could not be executed at all.
    #[error(transparent)]
    Transport(#[from] FetchError),

    /// The primary query returned data of an unexpected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StatsError {
    /// Default message when the upstream error payload carries none.
    pub const DEFAULT_UPSTREAM_MESSAGE: &'static str = "Could not fetch user.";

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StatsError::UpstreamQuery {
                kind: UpstreamErrorKind::UserNotFound,
                ..
            }
        )
    }
}
