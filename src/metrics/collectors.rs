//! High-level recording interface over the raw Prometheus metrics.
//!
//! Every method is a no-op until [`init_metrics`](super::init_metrics) has
//! run, so library users that never export metrics pay nothing.

use std::time::Duration;

use super::prometheus::metrics;

/// Metrics collector for benchmark runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn record_run_started(&self) {
        if let Some(m) = metrics() {
            m.runs_total.inc();
        }
    }

    pub fn unit_started(&self) {
        if let Some(m) = metrics() {
            m.units_in_flight.inc();
        }
    }

    /// Record a finished unit under its outcome label.
    pub fn unit_finished(&self, outcome: &str) {
        if let Some(m) = metrics() {
            m.units_in_flight.dec();
            m.units_total.with_label_values(&[outcome]).inc();
        }

        tracing::trace!(outcome = outcome, "Recorded unit metric");
    }

    pub fn record_execute_duration(&self, duration: Duration) {
        if let Some(m) = metrics() {
            m.execute_duration.observe(duration.as_secs_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{export_metrics, init_metrics};

    #[test]
    fn test_collector_records_outcomes() {
        init_metrics().expect("metrics should initialize");
        let collector = MetricsCollector::new();

        collector.record_run_started();
        collector.unit_started();
        collector.record_execute_duration(Duration::from_millis(120));
        collector.unit_finished("execute_failed");

        let metrics = export_metrics();
        assert!(metrics.contains("outcome=\"execute_failed\""));
        assert!(metrics.contains("ci_benchmarker_execute_duration_seconds"));
    }
}
