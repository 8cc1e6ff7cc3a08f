//! Benchmark run configuration.
//!
//! Values come from defaults, then `BENCHMARK_*` environment variables, then
//! command-line overrides applied through the builder methods.

use std::time::Duration;

use clap::ValueEnum;

use crate::error::ConfigError;
use crate::executor::http::DEFAULT_HTTP_TIMEOUT;

/// Which executor backend launches the jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExecutorKind {
    /// Mint identifiers locally without contacting a CI system.
    #[default]
    Local,
    /// POST a trigger request to a CI HTTP endpoint.
    Http,
}

impl std::str::FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ExecutorKind::Local),
            "http" => Ok(ExecutorKind::Http),
            other => Err(format!("unknown executor '{}', expected 'local' or 'http'", other)),
        }
    }
}

/// Configuration for one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of job units to launch.
    pub job_count: usize,
    /// Executor backend.
    pub executor: ExecutorKind,
    /// Trigger URL for the HTTP executor.
    pub executor_url: Option<String>,
    /// Bearer token for the HTTP executor.
    pub executor_token: Option<String>,
    /// Request timeout for the HTTP executor.
    pub http_timeout: Duration,
    /// SQLite URL for job records; `None` keeps records in memory.
    pub database_url: Option<String>,
    /// Per-unit deadline; `None` lets units run unbounded.
    pub unit_timeout: Option<Duration>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            job_count: 1,
            executor: ExecutorKind::Local,
            executor_url: None,
            executor_token: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            database_url: None,
            unit_timeout: None,
        }
    }
}

impl BenchmarkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from `BENCHMARK_*` environment variables on top
    /// of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the result
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `BENCHMARK_*` values through `lookup` without validating the
    /// result, so callers can layer further overrides first.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("BENCHMARK_JOB_COUNT") {
            config.job_count = parse_env_value(&val, "BENCHMARK_JOB_COUNT")?;
        }

        if let Some(val) = lookup("BENCHMARK_EXECUTOR") {
            config.executor = val.parse().map_err(|message| ConfigError::InvalidValue {
                key: "BENCHMARK_EXECUTOR".to_string(),
                message,
            })?;
        }

        if let Some(val) = lookup("BENCHMARK_EXECUTOR_URL") {
            config.executor_url = Some(val);
        }

        if let Some(val) = lookup("BENCHMARK_EXECUTOR_TOKEN") {
            config.executor_token = Some(val);
        }

        if let Some(val) = lookup("BENCHMARK_HTTP_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "BENCHMARK_HTTP_TIMEOUT_SECS")?;
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(val) = lookup("BENCHMARK_DATABASE_URL") {
            config.database_url = Some(val);
        }

        if let Some(val) = lookup("BENCHMARK_UNIT_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "BENCHMARK_UNIT_TIMEOUT_SECS")?;
            config.unit_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor == ExecutorKind::Http {
            match self.executor_url.as_deref() {
                Some(url) if !url.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::ValidationFailed(
                        "executor_url is required for the http executor".to_string(),
                    ))
                }
            }
        }

        if self.http_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "http_timeout must be greater than 0".to_string(),
            ));
        }

        if matches!(self.unit_timeout, Some(t) if t.is_zero()) {
            return Err(ConfigError::ValidationFailed(
                "unit_timeout must be greater than 0".to_string(),
            ));
        }

        if matches!(self.database_url.as_deref(), Some(url) if url.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "database_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_job_count(mut self, job_count: usize) -> Self {
        self.job_count = job_count;
        self
    }

    pub fn with_executor(mut self, executor: ExecutorKind) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_executor_url(mut self, url: impl Into<String>) -> Self {
        self.executor_url = Some(url.into());
        self
    }

    pub fn with_executor_token(mut self, token: impl Into<String>) -> Self {
        self.executor_token = Some(token.into());
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = Some(timeout);
        self
    }
}

/// Parse an environment variable value into a typed value.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.job_count, 1);
        assert_eq!(config.executor, ExecutorKind::Local);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(config.executor_url.is_none());
        assert!(config.database_url.is_none());
        assert!(config.unit_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BenchmarkConfig::new()
            .with_job_count(50)
            .with_executor(ExecutorKind::Http)
            .with_executor_url("https://ci.example.com/trigger")
            .with_executor_token("t0ken")
            .with_http_timeout(Duration::from_secs(10))
            .with_database_url("sqlite://jobs.db")
            .with_unit_timeout(Duration::from_secs(60));

        assert_eq!(config.job_count, 50);
        assert_eq!(config.executor, ExecutorKind::Http);
        assert_eq!(
            config.executor_url.as_deref(),
            Some("https://ci.example.com/trigger")
        );
        assert_eq!(config.executor_token.as_deref(), Some("t0ken"));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.database_url.as_deref(), Some("sqlite://jobs.db"));
        assert_eq!(config.unit_timeout, Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = BenchmarkConfig::from_lookup(lookup_from(&[
            ("BENCHMARK_JOB_COUNT", "25"),
            ("BENCHMARK_EXECUTOR", "HTTP"),
            ("BENCHMARK_EXECUTOR_URL", "http://localhost:9000/jobs"),
            ("BENCHMARK_EXECUTOR_TOKEN", "abc"),
            ("BENCHMARK_HTTP_TIMEOUT_SECS", "5"),
            ("BENCHMARK_DATABASE_URL", "sqlite://bench.db"),
            ("BENCHMARK_UNIT_TIMEOUT_SECS", "120"),
        ]))
        .expect("config should load");

        assert_eq!(config.job_count, 25);
        assert_eq!(config.executor, ExecutorKind::Http);
        assert_eq!(
            config.executor_url.as_deref(),
            Some("http://localhost:9000/jobs")
        );
        assert_eq!(config.executor_token.as_deref(), Some("abc"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.database_url.as_deref(), Some("sqlite://bench.db"));
        assert_eq!(config.unit_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = BenchmarkConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config.job_count, 1);
        assert_eq!(config.executor, ExecutorKind::Local);
    }

    #[test]
    fn test_from_lookup_invalid_job_count() {
        let err = BenchmarkConfig::from_lookup(lookup_from(&[("BENCHMARK_JOB_COUNT", "-3")]))
            .expect_err("negative job count should fail");
        assert!(err.to_string().contains("BENCHMARK_JOB_COUNT"));
    }

    #[test]
    fn test_from_lookup_unknown_executor() {
        let err = BenchmarkConfig::from_lookup(lookup_from(&[("BENCHMARK_EXECUTOR", "gitlab")]))
            .expect_err("unknown executor should fail");
        assert!(err.to_string().contains("gitlab"));
    }

    #[test]
    fn test_validation_http_requires_url() {
        let config = BenchmarkConfig::new().with_executor(ExecutorKind::Http);
        let err = config.validate().expect_err("missing url should fail");
        assert!(err.to_string().contains("executor_url"));
    }

    #[test]
    fn test_validation_zero_timeouts() {
        let config = BenchmarkConfig::new().with_unit_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = BenchmarkConfig::new().with_http_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_jobs_is_valid() {
        let config = BenchmarkConfig::new().with_job_count(0);
        assert!(config.validate().is_ok());
    }
}
