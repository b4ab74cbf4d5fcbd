use hdrhistogram::Histogram as HdrHistogram;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Percentile summary in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p99_9: u64,
}

impl LatencyPercentiles {
    #[inline]
    pub fn p50_us(&self) -> f64 {
        self.p50 as f64 / 1_000.0
    }

    #[inline]
    pub fn p99_us(&self) -> f64 {
        self.p99 as f64 / 1_000.0
    }
}

/// Point-in-time digest of one histogram: the moments plus the tail. The
/// histogram is the single store for latency samples; everything here is
/// derived from it on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: u64,
    pub mean_ns: f64,
    pub stdev_ns: f64,
    pub max_ns: u64,
    pub percentiles: LatencyPercentiles,
}

/// HDR histogram of latency samples. Values outside the recordable range are
/// counted but saturated rather than dropped.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    inner: HdrHistogram<u64>,
}

impl LatencyHistogram {
    /// Three significant digits over the full u64 range, the usual trade-off
    /// for nanosecond latencies.
    pub fn new() -> Self {
        Self {
            inner: HdrHistogram::<u64>::new(3).expect("3 significant figures is a valid histogram precision"),
        }
    }

    #[inline]
    pub fn record(&mut self, latency: Duration) {
        self.record_ns(latency.as_nanos() as u64);
    }

    #[inline]
    pub fn record_ns(&mut self, ns: u64) {
        self.inner.saturating_record(ns);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn value_at(&self, percentile: f64) -> u64 {
        self.inner.value_at_percentile(percentile)
    }

    #[inline]
    pub fn max_ns(&self) -> u64 {
        self.inner.max()
    }

    #[inline]
    pub fn mean_ns(&self) -> f64 {
        self.inner.mean()
    }

    #[inline]
    pub fn stdev_ns(&self) -> f64 {
        self.inner.stdev()
    }

    pub fn percentiles(&self) -> LatencyPercentiles {
        LatencyPercentiles {
            p50: self.value_at(50.0),
            p90: self.value_at(90.0),
            p99: self.value_at(99.0),
            p99_9: self.value_at(99.9),
        }
    }

    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            count: self.count(),
            mean_ns: self.mean_ns(),
            stdev_ns: self.stdev_ns(),
            max_ns: self.max_ns(),
            percentiles: self.percentiles(),
        }
    }

    pub fn merge(&mut self, other: &LatencyHistogram) {
        let _ = self.inner.add(&other.inner);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
