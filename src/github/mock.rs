//! Scripted query executor for tests.
//!
//! Responses are chosen by a handler closure over (query name, variables),
//! and every call is recorded so tests can assert on what was sent.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::executor::{GraphQlQuery, QueryExecutor, ResponseEnvelope};
use crate::error::FetchError;

/// Record of an executed query.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub query: &'static str,
    pub variables: Value,
}

type Handler = dyn Fn(&str, &Value) -> Result<ResponseEnvelope, FetchError> + Send + Sync;

pub struct MockExecutor {
    handler: Box<Handler>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockExecutor {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<ResponseEnvelope, FetchError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls made for the named query.
    pub fn calls_to(&self, query: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.query == query)
            .count()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(
        &self,
        query: &GraphQlQuery,
        variables: Value,
    ) -> Result<ResponseEnvelope, FetchError> {
        self.calls.lock().unwrap().push(MockCall {
            query: query.name,
            variables: variables.clone(),
        });
        // Yield so concurrent calls interleave like real requests.
        tokio::task::yield_now().await;
        (self.handler)(query.name, &variables)
    }
}
