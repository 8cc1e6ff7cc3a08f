//! Job execution backends.
//!
//! An [`Executor`] launches one benchmark job on a CI system and hands back
//! the identifier the CI system assigned to it. The benchmark runner shares a
//! single executor across all concurrently running job units, so
//! implementations must be safe to call from many tasks at once.
//!
//! - **LocalExecutor**: mints UUIDs in-process, for dry runs
//! - **HttpExecutor**: triggers a job through a CI HTTP endpoint

pub mod http;
pub mod local;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

pub use http::{HttpExecutor, HttpExecutorConfig};
pub use local::LocalExecutor;

/// Opaque identifier of a job launched on the CI backend.
///
/// The runner never looks inside it; it is only passed on to the persister.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Capability that launches a single job on the CI backend.
#[async_trait]
pub trait Executor: Send + Sync + fmt::Debug {
    /// Launch one job and return its identifier.
    ///
    /// May take arbitrarily long; callers that need a bound must impose it.
    async fn execute(&self) -> Result<JobId, ExecutionError>;

    /// Short name used in log fields.
    fn name(&self) -> &str;
}
