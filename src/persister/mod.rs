//! Job record storage backends.
//!
//! A [`Persister`] records the identifier of every launched job together with
//! the time it was stored. The benchmark runner only ever writes; reading the
//! records back is left to the concrete store.
//!
//! - **MemoryPersister**: in-process vector, for dry runs and tests
//! - **SqlitePersister**: SQLite table via sqlx

pub mod memory;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::executor::JobId;

pub use memory::MemoryPersister;
pub use sqlite::SqlitePersister;

/// A stored job: its identifier and when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub stored_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(id: JobId, stored_at: DateTime<Utc>) -> Self {
        Self { id, stored_at }
    }
}

/// Capability that records launched jobs.
#[async_trait]
pub trait Persister: Send + Sync + fmt::Debug {
    /// Record `id` with timestamp `at`.
    async fn store_job(&self, id: &JobId, at: DateTime<Utc>) -> Result<(), PersistError>;

    /// Short name used in log fields.
    fn name(&self) -> &str;
}
