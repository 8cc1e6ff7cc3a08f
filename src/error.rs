//! Error types for ci-benchmarker operations.
//!
//! Defines the error types raised at each subsystem boundary:
//! - Job execution against the CI backend
//! - Job record persistence
//! - Configuration loading and validation

use thiserror::Error;

/// Errors raised by an [`Executor`](crate::executor::Executor) when a job
/// cannot be launched.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("CI backend returned {status}: {message}")]
    BackendStatus { status: u16, message: String },

    #[error("Failed to parse CI backend response: {0}")]
    InvalidResponse(String),

    #[error("CI backend returned an empty job identifier")]
    EmptyIdentifier,

    #[error("Executor unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a [`Persister`](crate::persister::Persister) while
/// recording a job.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Job '{0}' already stored")]
    Duplicate(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        let err = ExecutionError::BackendStatus {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));

        let err = ExecutionError::EmptyIdentifier;
        assert!(err.to_string().contains("empty job identifier"));
    }

    #[test]
    fn test_persist_error_display() {
        let err = PersistError::Duplicate("job-7".to_string());
        assert!(err.to_string().contains("job-7"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "BENCHMARK_JOB_COUNT".to_string(),
            message: "not a number".to_string(),
        };
        assert!(err.to_string().contains("BENCHMARK_JOB_COUNT"));
    }
}
