//! ci-benchmarker: fan out identical CI jobs and record their identifiers.
//!
//! The [`BenchmarkRunner`] launches a configurable number of job units
//! concurrently. Each unit asks an [`Executor`] to start a job on the CI
//! backend and hands the returned identifier to a [`Persister`].

pub mod benchmark;
pub mod cli;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod persister;

pub use benchmark::{BenchmarkConfig, BenchmarkRunner, RunReport, UnitOutcome, UnitReport};
pub use error::{ConfigError, ExecutionError, PersistError};
pub use executor::{Executor, JobId};
pub use persister::{JobRecord, Persister};
