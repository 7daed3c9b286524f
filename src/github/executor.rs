//! The single-query executor contract.
//!
//! Everything above this layer sees one call per query: the executor owns
//! retries, backoff and credential rotation, and its answer is final.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// GraphQL error `type` GitHub uses for exhausted rate limits.
pub const RATE_LIMITED_TYPE: &str = "RATE_LIMITED";

/// A named GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphQlQuery {
    /// Operation name, used for logging and by test doubles.
    pub name: &'static str,
    pub document: &'static str,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// A GraphQL response: a data payload, an error list, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQlError>>,
}

impl ResponseEnvelope {
    /// An envelope carrying only data.
    #[allow(dead_code)] // Used by test doubles
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// An envelope carrying a single error.
    #[allow(dead_code)] // Used by test doubles
    pub fn with_error(message: &str, error_type: Option<&str>) -> Self {
        Self {
            data: None,
            errors: Some(vec![GraphQlError {
                message: message.to_string(),
                error_type: error_type.map(String::from),
            }]),
        }
    }

    pub fn errors(&self) -> &[GraphQlError] {
        self.errors.as_deref().unwrap_or(&[])
    }

    /// A non-empty error list makes the request a failure.
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    pub fn first_error_message(&self) -> Option<&str> {
        self.errors()
            .iter()
            .map(|e| e.message.as_str())
            .find(|m| !m.is_empty())
    }

    pub fn is_rate_limited(&self) -> bool {
        self.errors()
            .iter()
            .any(|e| e.error_type.as_deref() == Some(RATE_LIMITED_TYPE))
    }
}

/// Executes one GraphQL query with whatever resilience the implementation
/// provides.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        query: &GraphQlQuery,
        variables: Value,
    ) -> Result<ResponseEnvelope, FetchError>;
}
