//! Executor that triggers jobs through a CI system's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Executor, JobId};
use crate::error::ExecutionError;

/// Default timeout for a single trigger request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`HttpExecutor`].
#[derive(Debug, Clone)]
pub struct HttpExecutorConfig {
    /// URL that launches one job when POSTed to.
    pub endpoint: String,
    /// Optional bearer token sent in the `Authorization` header.
    pub token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// JSON body sent with every trigger request.
    pub payload: serde_json::Value,
}

impl HttpExecutorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
            payload: serde_json::json!({}),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Body returned by the CI trigger endpoint. Either field may carry the id.
#[derive(Debug, Deserialize)]
struct TriggerResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    uuid: Option<String>,
}

/// Executor that POSTs a trigger request to a CI endpoint.
#[derive(Debug)]
pub struct HttpExecutor {
    config: HttpExecutorConfig,
    http_client: Client,
}

impl HttpExecutor {
    /// Builds the executor and its HTTP client.
    pub fn new(config: HttpExecutorConfig) -> Result<Self, ExecutionError> {
        if config.endpoint.trim().is_empty() {
            return Err(ExecutionError::Unavailable(
                "executor endpoint cannot be empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

/// Extracts the job identifier from a trigger response body.
///
/// Accepts `{"id": "..."}`, `{"id": 123}` or `{"uuid": "..."}`.
fn parse_trigger_response(body: &str) -> Result<JobId, ExecutionError> {
    let response: TriggerResponse = serde_json::from_str(body)
        .map_err(|e| ExecutionError::InvalidResponse(format!("{}: {}", e, body)))?;

    let id = match (response.id, response.uuid) {
        (Some(serde_json::Value::String(s)), _) => s,
        (Some(serde_json::Value::Number(n)), _) => n.to_string(),
        (Some(other), _) => {
            return Err(ExecutionError::InvalidResponse(format!(
                "unsupported id type: {}",
                other
            )))
        }
        (None, Some(uuid)) => uuid,
        (None, None) => {
            return Err(ExecutionError::InvalidResponse(
                "response has neither 'id' nor 'uuid'".to_string(),
            ))
        }
    };

    if id.trim().is_empty() {
        return Err(ExecutionError::EmptyIdentifier);
    }

    Ok(JobId::new(id))
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self) -> Result<JobId, ExecutionError> {
        let mut http_request = self
            .http_client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json");

        if let Some(ref token) = self.config.token {
            http_request = http_request.header("Authorization", format!("Bearer {}", token));
        }

        let http_response = http_request
            .json(&self.config.payload)
            .send()
            .await
            .map_err(|e| ExecutionError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        let body = http_response
            .text()
            .await
            .map_err(|e| ExecutionError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(ExecutionError::BackendStatus {
                status: status.as_u16(),
                message: body,
            });
        }

        let id = parse_trigger_response(&body)?;
        debug!(endpoint = %self.config.endpoint, job_id = %id, "CI job triggered");
        Ok(id)
    }

    fn name(&self) -> &str {
        "http"
    }
}
