//! HTTP client for the GitHub GraphQL API.
//!
//! Handles transport, automatic retry with exponential backoff, and rotation
//! through the configured tokens when one is rate limited or rejected.

use std::time::Duration;

use async_trait::async_trait;
use rand::{thread_rng, Rng};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::executor::{GraphQlQuery, QueryExecutor, ResponseEnvelope};
use crate::error::FetchError;

/// Connection settings, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint.
    pub api_url: String,
    /// Personal access tokens, tried in order.
    pub tokens: Vec<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com/graphql".to_string(),
            tokens: Vec::new(),
            timeout: Duration::from_secs(30),
            user_agent: format!("devprofile/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Configuration for automatic retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts per token
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Maximum backoff time in seconds
    pub max_backoff: f64,
    /// Jitter factor (0.1 = ±10%)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            backoff_factor: 2.0,
            max_backoff: 30.0,
            jitter: 0.1,
        }
    }
}

/// What to do after one HTTP exchange.
enum Attempt {
    Done(ResponseEnvelope),
    /// The token is rejected; switch to the next one.
    BadCredentials,
    /// The token is rate limited. Switch tokens, or back off on the last
    /// one. A GraphQL-level rate limit keeps its envelope so the final
    /// answer can still be handed to the caller.
    RateLimited {
        envelope: Option<ResponseEnvelope>,
        retry_after: Option<u64>,
    },
    /// Back off and try again with the same token.
    Retry {
        error: FetchError,
        retry_after: Option<u64>,
    },
    Fail(FetchError),
}

/// GraphQL client with retry and token rotation.
pub struct GithubClient {
    config: ClientConfig,
    retry: RetryConfig,
    http_client: Client,
}

impl GithubClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is configured or the HTTP client cannot
    /// be created.
    pub fn new(config: ClientConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        if config.tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(FetchError::NoTokens);
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let config = ClientConfig {
            tokens: config
                .tokens
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .collect(),
            ..config
        };

        Ok(Self {
            config,
            retry,
            http_client,
        })
    }

    /// Send one request with one token and classify the outcome.
    async fn attempt(&self, body: &Value, token: &str) -> Attempt {
        let response = match self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let error = if e.is_timeout() {
                    FetchError::Http(format!(
                        "Request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    FetchError::Http(format!("Cannot connect to {}", self.config.api_url))
                } else {
                    FetchError::Http(e.to_string())
                };
                return Attempt::Retry {
                    error,
                    retry_after: None,
                };
            }
        };

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Attempt::BadCredentials;
        }

        if status.is_success() {
            return match response.json::<ResponseEnvelope>().await {
                Ok(envelope) if envelope.is_rate_limited() => Attempt::RateLimited {
                    envelope: Some(envelope),
                    retry_after: None,
                },
                Ok(envelope) => Attempt::Done(envelope),
                Err(e) => Attempt::Fail(FetchError::Decode(e.to_string())),
            };
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let text = response.text().await.unwrap_or_default();

        if is_rate_limit_response(status, &text) {
            return Attempt::RateLimited {
                envelope: None,
                retry_after,
            };
        }

        let error = FetchError::Status {
            status: status.as_u16(),
            body: text,
        };

        if status.is_server_error() {
            Attempt::Retry { error, retry_after }
        } else {
            Attempt::Fail(error)
        }
    }

    /// Calculate backoff time in seconds for a retry.
    ///
    /// Uses exponential backoff with jitter, preferring the server's
    /// Retry-After value when present.
    fn backoff_seconds(&self, attempt: u32, retry_after: Option<u64>) -> f64 {
        // Config is validated on load; this keeps a bad value from panicking.
        let cap = if self.retry.max_backoff.is_finite() {
            self.retry.max_backoff.max(0.0)
        } else {
            0.0
        };

        if let Some(seconds) = retry_after {
            return (seconds as f64).min(cap);
        }

        let base_wait = self.retry.initial_backoff_ms as f64 / 1000.0
            * self.retry.backoff_factor.powi(attempt as i32);

        let jitter_range = base_wait * self.retry.jitter;
        let wait_time = if jitter_range.is_finite() && jitter_range > 0.0 {
            base_wait + thread_rng().gen_range(-jitter_range..jitter_range)
        } else {
            base_wait
        };

        if wait_time.is_finite() {
            wait_time.clamp(0.0, cap)
        } else {
            cap
        }
    }
}

#[async_trait]
impl QueryExecutor for GithubClient {
    async fn execute(
        &self,
        query: &GraphQlQuery,
        variables: Value,
    ) -> Result<ResponseEnvelope, FetchError> {
        let body = json!({ "query": query.document, "variables": variables });
        let mut token_index = 0;
        let mut attempt = 0;

        loop {
            let token = &self.config.tokens[token_index];
            debug!(
                "Executing {} (token #{}, attempt {})",
                query.name,
                token_index + 1,
                attempt + 1
            );

            match self.attempt(&body, token).await {
                Attempt::Done(envelope) => return Ok(envelope),
                Attempt::Fail(error) => return Err(error),
                Attempt::BadCredentials => {
                    token_index += 1;
                    if token_index >= self.config.tokens.len() {
                        return Err(FetchError::BadCredentials);
                    }
                    warn!("Token rejected; switching to token #{}", token_index + 1);
                    attempt = 0;
                }
                Attempt::RateLimited {
                    envelope,
                    retry_after,
                } => {
                    if token_index + 1 < self.config.tokens.len() {
                        token_index += 1;
                        warn!("Rate limited; switching to token #{}", token_index + 1);
                        attempt = 0;
                        continue;
                    }
                    if attempt >= self.retry.max_retries {
                        // Hand back the upstream payload so callers can classify it.
                        return envelope.ok_or(FetchError::RateLimited);
                    }
                    let wait = self.backoff_seconds(attempt, retry_after);
                    warn!(
                        "{} rate limited on last token; retrying in {:.1}s",
                        query.name, wait
                    );
                    tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                    attempt += 1;
                }
                Attempt::Retry { error, retry_after } => {
                    if attempt >= self.retry.max_retries {
                        return Err(error);
                    }
                    let wait = self.backoff_seconds(attempt, retry_after);
                    warn!(
                        "{} failed ({}); retrying in {:.1}s",
                        query.name, error, wait
                    );
                    tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// GitHub reports secondary and primary rate limits as 403 or 429.
fn is_rate_limit_response(status: StatusCode, body: &str) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => body.to_lowercase().contains("rate limit"),
        _ => false,
    }
}
