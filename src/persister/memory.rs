//! In-memory job store.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{JobRecord, Persister};
use crate::error::PersistError;
use crate::executor::JobId;

/// Persister that keeps every record in a vector behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    records: Mutex<Vec<JobRecord>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in insertion order.
    pub fn records(&self) -> Vec<JobRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .map(|records| records.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Persister for MemoryPersister {
    async fn store_job(&self, id: &JobId, at: DateTime<Utc>) -> Result<(), PersistError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| PersistError::Unavailable("record lock poisoned".to_string()))?;
        records.push(JobRecord::new(id.clone(), at));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_persister_records_in_order() {
        let persister = MemoryPersister::new();
        assert!(persister.is_empty());

        let now = Utc::now();
        persister
            .store_job(&JobId::from("a"), now)
            .await
            .expect("store should succeed");
        persister
            .store_job(&JobId::from("b"), now)
            .await
            .expect("store should succeed");

        let records = persister.records();
        assert_eq!(persister.len(), 2);
        assert_eq!(records[0].id.as_str(), "a");
        assert_eq!(records[1].id.as_str(), "b");
        assert_eq!(records[1].stored_at, now);
    }
}
