//! Benchmark runner: fans out identical jobs and records their identifiers.
//!
//! A run launches `job_count` independent job units as tokio tasks. Each unit
//! asks the [`Executor`] for a new job and, if that succeeds, hands the
//! returned identifier and the current time to the [`Persister`]. The run
//! returns once every unit has reached a terminal state.
//!
//! ```text
//!                 ┌─────────────────┐
//!                 │ BenchmarkRunner │
//!                 └────────┬────────┘
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!     ┌─────────┐     ┌─────────┐     ┌─────────┐
//!     │ unit 0  │     │ unit 1  │     │ unit N-1│   execute -> store_job
//!     └────┬────┘     └────┬────┘     └────┬────┘
//!          └───────────────┼───────────────┘
//!                          ▼
//!                    join barrier -> RunReport
//! ```
//!
//! Failures never abort the run and never surface as an error: a failed
//! execute is logged and ends that unit without touching the persister, a
//! failed store is logged and ends the unit. Both are recorded in the
//! [`RunReport`]. Units are not retried, not throttled and not ordered.

pub mod config;
pub mod report;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::executor::{Executor, JobId};
use crate::metrics::MetricsCollector;
use crate::persister::Persister;

pub use config::{BenchmarkConfig, ExecutorKind};
pub use report::{RunReport, UnitOutcome, UnitReport};

/// Orchestrates one benchmark run.
///
/// The executor and persister are shared by every unit of the run and must
/// tolerate concurrent calls.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    job_count: usize,
    executor: Arc<dyn Executor>,
    persister: Arc<dyn Persister>,
    unit_timeout: Option<Duration>,
    metrics: MetricsCollector,
}

impl BenchmarkRunner {
    /// Creates a runner that launches `job_count` units.
    pub fn new(
        job_count: usize,
        executor: Arc<dyn Executor>,
        persister: Arc<dyn Persister>,
    ) -> Self {
        Self {
            job_count,
            executor,
            persister,
            unit_timeout: None,
            metrics: MetricsCollector::new(),
        }
    }

    /// Bounds each unit's executor call by `timeout`.
    ///
    /// Units whose launch exceeds it end as [`UnitOutcome::TimedOut`]. A job
    /// that did launch is always stored, however long the store takes.
    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = Some(timeout);
        self
    }

    pub fn job_count(&self) -> usize {
        self.job_count
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn persister(&self) -> &Arc<dyn Persister> {
        &self.persister
    }

    /// Launches all units and waits for every one of them to finish.
    ///
    /// Never fails. Per-unit failures are logged and reported in the
    /// returned [`RunReport`].
    pub async fn run(&self) -> RunReport {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.run_until(shutdown_rx).await
    }

    /// Like [`run`](Self::run), but units still waiting on the executor when
    /// `shutdown` turns `true` end as [`UnitOutcome::Cancelled`]. Units whose
    /// job already launched finish storing it.
    ///
    /// The barrier still waits for every unit. Dropping the sender without
    /// signalling leaves the run unaffected. Dropping the returned future
    /// detaches the units; they keep running to completion.
    pub async fn run_until(&self, shutdown: watch::Receiver<bool>) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();

        self.metrics.record_run_started();
        debug!(
            number = self.job_count,
            executor = self.executor.name(),
            persister = self.persister.name(),
            "Running jobs"
        );

        let handles: Vec<_> = (0..self.job_count)
            .map(|unit| {
                let job_unit = JobUnit {
                    unit,
                    executor: Arc::clone(&self.executor),
                    persister: Arc::clone(&self.persister),
                    timeout: self.unit_timeout,
                    metrics: self.metrics,
                };
                tokio::spawn(job_unit.run(shutdown.clone()))
            })
            .collect();

        let results = futures::future::join_all(handles).await;

        let units: Vec<UnitReport> = results
            .into_iter()
            .enumerate()
            .map(|(unit, result)| match result {
                Ok(report) => report,
                Err(e) => {
                    error!(unit = unit, error = %e, "Job unit panicked");
                    self.metrics.unit_finished("panicked");
                    UnitReport::new(
                        unit,
                        UnitOutcome::Panicked {
                            message: e.to_string(),
                        },
                        Duration::ZERO,
                    )
                }
            })
            .collect();

        let report = RunReport::new(started_at, Utc::now(), start.elapsed(), units);

        info!(
            attempted = report.attempted(),
            stored = report.stored(),
            execute_failures = report.execute_failures(),
            store_failures = report.store_failures(),
            timed_out = report.timed_out(),
            cancelled = report.cancelled(),
            duration_ms = report.duration_ms,
            "Benchmark run finished"
        );

        report
    }
}

/// One execute-then-store cycle, owned by its tokio task.
struct JobUnit {
    unit: usize,
    executor: Arc<dyn Executor>,
    persister: Arc<dyn Persister>,
    timeout: Option<Duration>,
    metrics: MetricsCollector,
}

impl JobUnit {
    async fn run(self, mut shutdown: watch::Receiver<bool>) -> UnitReport {
        let start = Instant::now();
        self.metrics.unit_started();
        debug!(unit = self.unit, "Scheduling job");

        let outcome = match self.launch(&mut shutdown).await {
            Ok(job_id) => self.store(job_id).await,
            Err(outcome) => outcome,
        };

        self.metrics.unit_finished(outcome.label());
        UnitReport::new(self.unit, outcome, start.elapsed())
    }

    /// Races the executor against shutdown and the unit deadline.
    ///
    /// Only the launch is interruptible: once a job exists on the CI backend
    /// its identifier is always handed to the persister.
    async fn launch(&self, shutdown: &mut watch::Receiver<bool>) -> Result<JobId, UnitOutcome> {
        tokio::select! {
            biased;
            () = wait_for_shutdown(shutdown) => {
                warn!(unit = self.unit, "Job unit cancelled by shutdown");
                Err(UnitOutcome::Cancelled)
            }
            result = self.execute_with_deadline() => result,
        }
    }

    async fn execute_with_deadline(&self) -> Result<JobId, UnitOutcome> {
        let Some(limit) = self.timeout else {
            return self.execute().await;
        };

        match tokio::time::timeout(limit, self.execute()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    unit = self.unit,
                    timeout_ms = limit.as_millis() as u64,
                    "Job unit timed out"
                );
                Err(UnitOutcome::TimedOut)
            }
        }
    }

    async fn execute(&self) -> Result<JobId, UnitOutcome> {
        let execute_start = Instant::now();
        let result = self.executor.execute().await;
        self.metrics.record_execute_duration(execute_start.elapsed());

        result.map_err(|e| {
            error!(
                unit = self.unit,
                executor = self.executor.name(),
                error = %e,
                "Error while scheduling job"
            );
            UnitOutcome::ExecuteFailed {
                error: e.to_string(),
            }
        })
    }

    async fn store(&self, job_id: JobId) -> UnitOutcome {
        debug!(unit = self.unit, job_id = %job_id, "Storing job");

        match self.persister.store_job(&job_id, Utc::now()).await {
            Ok(()) => {
                debug!(unit = self.unit, job_id = %job_id, "Job stored successfully");
                UnitOutcome::Stored { job_id }
            }
            Err(e) => {
                error!(
                    unit = self.unit,
                    job_id = %job_id,
                    persister = self.persister.name(),
                    error = %e,
                    "Error while storing job"
                );
                UnitOutcome::StoreFailed {
                    job_id,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Resolves once the shutdown flag turns `true`; never resolves if the
/// sender is dropped first.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
