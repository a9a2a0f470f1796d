//! Execution metrics collection.
//!
//! Mirrors the block system's metrics registry: named counters/timings
//! collected into a shared map so an explain hook or a benchmark harness
//! can read them back after a run, without the hot path taking a lock
//! per row.

use std::collections::HashMap;

use parking_lot::Mutex;

/// A named series of observations. Batches push one value per event;
/// the explain hook reduces each series to a sum or an average as
/// appropriate. `parking_lot::Mutex` has no poison state to unwrap at
/// every call site.
#[derive(Default)]
pub struct MetricsCollector {
    series: Mutex<HashMap<String, Vec<f64>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str, value: f64) {
        self.series.lock().entry(name.to_string()).or_default().push(value);
    }

    pub fn sum(&self, name: &str) -> f64 {
        self.series
            .lock()
            .get(name)
            .map(|values| values.iter().sum())
            .unwrap_or(0.0)
    }

    pub fn count(&self, name: &str) -> usize {
        self.series.lock().get(name).map(|values| values.len()).unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<String, Vec<f64>> {
        self.series.lock().clone()
    }
}
