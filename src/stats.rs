//! Per-endpoint statistics collection.

use hdrhistogram::Histogram;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;

/// Identifies a statistics bucket: HTTP method plus normalized path.
///
/// Requests that substitute a path parameter (the per-distribution
/// architectures lookups) share one bucket under their path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    /// HTTP method, e.g. "GET".
    pub method: &'static str,
    /// Normalized request path, e.g. "/architectures/{distribution}".
    pub name: &'static str,
}

impl EndpointKey {
    /// Create a key from a method and a normalized path.
    pub const fn new(method: &'static str, name: &'static str) -> Self {
        Self { method, name }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.name)
    }
}

/// Accumulated statistics for a single endpoint.
#[derive(Debug, Clone)]
pub struct EndpointStats {
    histogram: Histogram<u64>,
    num_requests: u64,
    num_failures: u64,
}

impl EndpointStats {
    /// Create an empty statistics bucket.
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).expect("Failed to create histogram"),
            num_requests: 0,
            num_failures: 0,
        }
    }

    /// Record one completed request. Latency is tracked for failures too;
    /// only the success flag feeds the failure ratio.
    pub fn record(&mut self, latency: Duration, success: bool) {
        self.num_requests += 1;
        if !success {
            self.num_failures += 1;
        }
        self.histogram.record(latency.as_micros() as u64).ok();
    }

    /// Total requests observed.
    pub fn requests(&self) -> u64 {
        self.num_requests
    }

    /// Failed requests observed.
    pub fn failures(&self) -> u64 {
        self.num_failures
    }

    /// Fraction of requests that failed.
    pub fn fail_ratio(&self) -> f64 {
        if self.num_requests == 0 {
            0.0
        } else {
            self.num_failures as f64 / self.num_requests as f64
        }
    }

    /// Mean latency in milliseconds.
    pub fn avg_ms(&self) -> f64 {
        self.histogram.mean() / 1000.0
    }

    /// Latency percentile in milliseconds.
    pub fn percentile_ms(&self, percentile: f64) -> f64 {
        self.histogram.value_at_percentile(percentile) as f64 / 1000.0
    }

    /// Median (p50) latency in milliseconds.
    pub fn median_ms(&self) -> f64 {
        self.percentile_ms(50.0)
    }

    /// 95th percentile latency in milliseconds.
    pub fn p95_ms(&self) -> f64 {
        self.percentile_ms(95.0)
    }

    /// Max latency in milliseconds.
    pub fn max_ms(&self) -> f64 {
        self.histogram.max() as f64 / 1000.0
    }
}

impl Default for EndpointStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalized statistics table consumed by the evaluator, in key order.
pub type StatsTable = BTreeMap<EndpointKey, EndpointStats>;

/// Thread-safe statistics registry shared by all virtual users.
pub struct StatsRegistry {
    entries: Mutex<StatsTable>,
}

impl StatsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record one completed request under its endpoint key.
    pub async fn record(&self, key: EndpointKey, latency: Duration, success: bool) {
        let mut entries = self.entries.lock().await;
        entries.entry(key).or_default().record(latency, success);
    }

    /// Discard everything accumulated so far (end of warmup).
    pub async fn reset(&self) {
        self.entries.lock().await.clear();
    }

    /// Clone the accumulated table.
    pub async fn snapshot(&self) -> StatsTable {
        self.entries.lock().await.clone()
    }
}

impl Default for StatsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
