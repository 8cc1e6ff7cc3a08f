//! In-process executor that does not contact any CI system.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use super::{Executor, JobId};
use crate::error::ExecutionError;

/// Executor that mints a fresh UUID for every call.
///
/// Useful for dry runs of the benchmark harness and for exercising a
/// persister without a CI backend. An optional latency simulates the time a
/// real trigger would take.
#[derive(Debug, Default)]
pub struct LocalExecutor {
    latency: Option<Duration>,
    launched: AtomicU64,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `latency` before returning each identifier.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of jobs this executor has launched so far.
    pub fn launched(&self) -> u64 {
        self.launched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn execute(&self) -> Result<JobId, ExecutionError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let id = JobId::new(Uuid::new_v4().to_string());
        self.launched.fetch_add(1, Ordering::SeqCst);
        trace!(job_id = %id, "Minted local job");
        Ok(id)
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_executor_mints_unique_ids() {
        let executor = LocalExecutor::new();

        let a = executor.execute().await.expect("local execute never fails");
        let b = executor.execute().await.expect("local execute never fails");

        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
        assert_eq!(executor.launched(), 2);
    }

    #[tokio::test]
    async fn test_local_executor_latency() {
        let executor = LocalExecutor::new().with_latency(Duration::from_millis(20));
        let start = std::time::Instant::now();

        executor.execute().await.expect("local execute never fails");

        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
