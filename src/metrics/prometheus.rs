//! Prometheus metrics registration and export.
//!
//! The registry and every metric registered with it live in one
//! [`BenchmarkMetrics`] value behind a single `OnceLock`, so recorders and
//! the exporter always see the same registration.

use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics for all ci-benchmarker runs.
static METRICS: OnceLock<BenchmarkMetrics> = OnceLock::new();

/// Registry plus the metrics registered with it.
#[derive(Debug, Clone)]
pub struct BenchmarkMetrics {
    pub registry: Registry,
    /// Total number of job units finished, labeled by outcome.
    pub units_total: CounterVec,
    /// Number of job units currently in flight.
    pub units_in_flight: Gauge,
    /// Time spent in the executor per unit, in seconds.
    pub execute_duration: Histogram,
    /// Total number of benchmark runs started.
    pub runs_total: Counter,
}

impl BenchmarkMetrics {
    fn register() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let units_total = CounterVec::new(
            Opts::new(
                "ci_benchmarker_units_total",
                "Total number of job units finished",
            ),
            &["outcome"],
        )?;

        let units_in_flight = Gauge::new(
            "ci_benchmarker_units_in_flight",
            "Number of job units currently running",
        )?;

        let execute_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ci_benchmarker_execute_duration_seconds",
                "Time spent launching a job on the CI backend",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let runs_total = Counter::new(
            "ci_benchmarker_runs_total",
            "Total number of benchmark runs started",
        )?;

        registry.register(Box::new(units_total.clone()))?;
        registry.register(Box::new(units_in_flight.clone()))?;
        registry.register(Box::new(execute_duration.clone()))?;
        registry.register(Box::new(runs_total.clone()))?;

        Ok(Self {
            registry,
            units_total,
            units_in_flight,
            execute_duration,
            runs_total,
        })
    }
}

/// Returns the global metrics, or `None` before [`init_metrics`] has run.
pub fn metrics() -> Option<&'static BenchmarkMetrics> {
    METRICS.get()
}

/// Initialize all metrics and register them with the registry.
///
/// Call once at startup. Later calls leave the first registration in place;
/// when two callers race, the loser's registration is discarded as a whole.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registered = BenchmarkMetrics::register()?;
    if METRICS.set(registered).is_ok() {
        tracing::debug!("Prometheus metrics initialized");
    }

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns an explanatory comment line if the registry was never initialized
/// or encoding fails.
pub fn export_metrics() -> String {
    let Some(metrics) = METRICS.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}
