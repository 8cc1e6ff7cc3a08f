//! Prometheus-based metrics for benchmark runs.
//!
//! # Example
//!
//! ```ignore
//! use ci_benchmarker::metrics::{export_metrics, init_metrics};
//!
//! init_metrics().expect("Failed to initialize metrics");
//! // ... run a benchmark ...
//! println!("{}", export_metrics());
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use self::prometheus::{export_metrics, init_metrics, BenchmarkMetrics};
