//! Per-operation timing for the query pipeline
//!
//! A [`PerformanceTracker`] is created once at startup and shared as an
//! `Arc` by every component that needs timing. Samples are appended under
//! the shard lock of a [`DashMap`], so concurrent queries never lose or
//! interleave samples.

use std::collections::BTreeMap;
use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Aggregated timings for a single operation, in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationMetrics {
    pub count: usize,
    pub total_time: f64,
    pub average_time: f64,
    pub min_time: f64,
    pub max_time: f64,
}

impl OperationMetrics {
    fn from_samples(samples: &[Duration]) -> Self {
        let secs: Vec<f64> = samples.iter().map(Duration::as_secs_f64).collect();
        let count = secs.len();
        let total_time: f64 = secs.iter().sum();
        let average_time = if count == 0 {
            0.0
        } else {
            total_time / count as f64
        };
        let min_time = secs.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max_time = secs.iter().copied().reduce(f64::max).unwrap_or(0.0);

        Self {
            count,
            total_time,
            average_time,
            min_time,
            max_time,
        }
    }
}

/// Process-wide store of duration samples keyed by operation name
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    samples: DashMap<String, Vec<Duration>>,
}

impl PerformanceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing `operation`; the sample is recorded when the guard drops,
    /// including on early returns and unwinding.
    pub fn track(&self, operation: impl Into<String>) -> TrackGuard<'_> {
        TrackGuard {
            tracker: self,
            operation: operation.into(),
            started: Instant::now(),
        }
    }

    /// Append a sample
    pub fn record(&self, operation: &str, duration: Duration) {
        self.samples
            .entry(operation.to_string())
            .or_default()
            .push(duration);
        debug!(
            "Operation '{}' completed in {:.4} seconds",
            operation,
            duration.as_secs_f64()
        );
    }

    /// Snapshot of aggregated metrics, ordered by operation name
    pub fn metrics(&self) -> BTreeMap<String, OperationMetrics> {
        self.samples
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    OperationMetrics::from_samples(entry.value()),
                )
            })
            .collect()
    }

    /// Number of samples recorded for `operation`
    pub fn sample_count(&self, operation: &str) -> usize {
        self.samples.get(operation).map_or(0, |s| s.len())
    }

    /// Drop every recorded sample
    pub fn reset(&self) {
        self.samples.clear();
    }
}

/// Scoped timer returned by [`PerformanceTracker::track`]
#[must_use = "the operation is timed until the guard is dropped"]
pub struct TrackGuard<'a> {
    tracker: &'a PerformanceTracker,
    operation: String,
    started: Instant,
}

impl Drop for TrackGuard<'_> {
    fn drop(&mut self) {
        self.tracker
            .record(&self.operation, self.started.elapsed());
    }
}
