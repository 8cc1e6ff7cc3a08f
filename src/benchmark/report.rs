//! Outcome types produced by a benchmark run.
//!
//! - `UnitOutcome`: terminal state of one job unit
//! - `UnitReport`: outcome plus timing for one unit
//! - `RunReport`: all unit reports of a run with summary accessors

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::JobId;

/// Terminal state of a single job unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// The job was launched and its record stored.
    Stored { job_id: JobId },
    /// The executor failed; the persister was never called.
    ExecuteFailed { error: String },
    /// The job was launched but storing its record failed.
    StoreFailed { job_id: JobId, error: String },
    /// The unit exceeded its deadline.
    TimedOut,
    /// The run was shut down while the unit was in flight.
    Cancelled,
    /// The unit's task panicked.
    Panicked { message: String },
}

impl UnitOutcome {
    /// Label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            UnitOutcome::Stored { .. } => "stored",
            UnitOutcome::ExecuteFailed { .. } => "execute_failed",
            UnitOutcome::StoreFailed { .. } => "store_failed",
            UnitOutcome::TimedOut => "timed_out",
            UnitOutcome::Cancelled => "cancelled",
            UnitOutcome::Panicked { .. } => "panicked",
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, UnitOutcome::Stored { .. })
    }

    /// Identifier of the launched job, if the executor succeeded.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            UnitOutcome::Stored { job_id } | UnitOutcome::StoreFailed { job_id, .. } => {
                Some(job_id)
            }
            _ => None,
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome and timing of one job unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Index of the unit within the run.
    pub unit: usize,
    pub outcome: UnitOutcome,
    /// Wall-clock time from unit start to terminal state, in milliseconds.
    pub duration_ms: u64,
}

impl UnitReport {
    pub fn new(unit: usize, outcome: UnitOutcome, duration: Duration) -> Self {
        Self {
            unit,
            outcome,
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Summary of a finished benchmark run.
///
/// `units` holds one report per launched unit, sorted by unit index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn new(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        duration: Duration,
        mut units: Vec<UnitReport>,
    ) -> Self {
        units.sort_by_key(|u| u.unit);
        Self {
            started_at,
            finished_at,
            duration_ms: duration.as_millis() as u64,
            units,
        }
    }

    /// Number of units launched.
    pub fn attempted(&self) -> usize {
        self.units.len()
    }

    pub fn stored(&self) -> usize {
        self.count(|o| o.is_stored())
    }

    pub fn execute_failures(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::ExecuteFailed { .. }))
    }

    pub fn store_failures(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::StoreFailed { .. }))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::TimedOut))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Cancelled))
    }

    pub fn panicked(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Panicked { .. }))
    }

    /// Units that did not end with a stored record.
    pub fn failed(&self) -> usize {
        self.attempted() - self.stored()
    }

    /// True when every launched unit stored its record.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Identifiers of all successfully stored jobs, in unit order.
    pub fn stored_ids(&self) -> Vec<&JobId> {
        self.units
            .iter()
            .filter_map(|u| match &u.outcome {
                UnitOutcome::Stored { job_id } => Some(job_id),
                _ => None,
            })
            .collect()
    }

    /// Success rate as a percentage; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        let total = self.attempted();
        if total == 0 {
            return 0.0;
        }
        (self.stored() as f64 / total as f64) * 100.0
    }

    fn count(&self, predicate: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.units.iter().filter(|u| predicate(&u.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(outcomes: Vec<UnitOutcome>) -> RunReport {
        let units = outcomes
            .into_iter()
            .enumerate()
            .rev()
            .map(|(i, o)| UnitReport::new(i, o, Duration::from_millis(10)))
            .collect();
        let now = Utc::now();
        RunReport::new(now, now, Duration::from_millis(25), units)
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(UnitOutcome::TimedOut.label(), "timed_out");
        assert_eq!(UnitOutcome::Cancelled.to_string(), "cancelled");
        assert_eq!(
            UnitOutcome::ExecuteFailed {
                error: "boom".to_string()
            }
            .label(),
            "execute_failed"
        );
    }

    #[test]
    fn test_outcome_job_id() {
        let stored = UnitOutcome::Stored {
            job_id: JobId::from("a"),
        };
        let store_failed = UnitOutcome::StoreFailed {
            job_id: JobId::from("b"),
            error: "disk full".to_string(),
        };

        assert_eq!(stored.job_id().map(JobId::as_str), Some("a"));
        assert_eq!(store_failed.job_id().map(JobId::as_str), Some("b"));
        assert!(UnitOutcome::TimedOut.job_id().is_none());
    }

    #[test]
    fn test_report_counts() {
        let report = report_with(vec![
            UnitOutcome::Stored {
                job_id: JobId::from("job-0"),
            },
            UnitOutcome::ExecuteFailed {
                error: "refused".to_string(),
            },
            UnitOutcome::StoreFailed {
                job_id: JobId::from("job-2"),
                error: "locked".to_string(),
            },
            UnitOutcome::TimedOut,
            UnitOutcome::Cancelled,
            UnitOutcome::Stored {
                job_id: JobId::from("job-5"),
            },
        ]);

        assert_eq!(report.attempted(), 6);
        assert_eq!(report.stored(), 2);
        assert_eq!(report.execute_failures(), 1);
        assert_eq!(report.store_failures(), 1);
        assert_eq!(report.timed_out(), 1);
        assert_eq!(report.cancelled(), 1);
        assert_eq!(report.panicked(), 0);
        assert_eq!(report.failed(), 4);
        assert!(!report.is_success());
        assert_eq!(report.duration_ms, 25);

        let ids: Vec<&str> = report.stored_ids().into_iter().map(JobId::as_str).collect();
        assert_eq!(ids, vec!["job-0", "job-5"]);
    }

    #[test]
    fn test_report_sorted_by_unit() {
        let report = report_with(vec![UnitOutcome::TimedOut, UnitOutcome::Cancelled]);
        assert_eq!(report.units[0].unit, 0);
        assert_eq!(report.units[1].unit, 1);
    }

    #[test]
    fn test_empty_report() {
        let report = report_with(vec![]);
        assert_eq!(report.attempted(), 0);
        assert!(report.is_success());
        assert!((report.success_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serialization() {
        let report = report_with(vec![UnitOutcome::Stored {
            job_id: JobId::from("job-0"),
        }]);

        let json = serde_json::to_value(&report).expect("serialization should work");
        assert_eq!(json["units"][0]["outcome"]["status"], "stored");
        assert_eq!(json["units"][0]["outcome"]["job_id"], "job-0");
    }
}
