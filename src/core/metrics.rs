//! Per-call timing records and rollups.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Number of records retained; older records are dropped first.
pub const METRICS_CAPACITY: usize = 1000;

const WINDOW_MS: i64 = 3_600_000;
const SLOWEST_ENDPOINTS: usize = 5;

/// Outcome of one completed call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiMetric {
    pub endpoint: String,
    pub method: String,
    pub duration: Duration,
    /// HTTP status, or the classified status of a failure (0 when no response).
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    pub cache_hit: bool,
    pub retry_count: u32,
}

impl ApiMetric {
    fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Mean timing for one `METHOD endpoint` group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EndpointTiming {
    pub endpoint: String,
    pub average_time_ms: f64,
    pub request_count: usize,
}

/// Rollup over the last hour of records. Rates are fractions in `[0, 1]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceData {
    pub total_requests: usize,
    pub average_response_time_ms: f64,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub error_rate: f64,
    pub slowest_endpoints: Vec<EndpointTiming>,
}

/// Bounded FIFO of [`ApiMetric`]s.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    records: Mutex<VecDeque<ApiMetric>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ApiMetric>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, metric: ApiMetric) {
        let mut records = self.lock();
        if records.len() == METRICS_CAPACITY {
            records.pop_front();
        }
        records.push_back(metric);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies of the retained records, oldest first.
    pub fn records(&self) -> Vec<ApiMetric> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn performance_data(&self) -> PerformanceData {
        self.performance_data_at(Utc::now())
    }

    /// Rollup over records with `timestamp` within one hour before `now`.
    pub fn performance_data_at(&self, now: DateTime<Utc>) -> PerformanceData {
        let since = now - TimeDelta::milliseconds(WINDOW_MS);
        let records = self.lock();
        let recent: Vec<&ApiMetric> = records.iter().filter(|m| m.timestamp > since).collect();

        let total = recent.len();
        if total == 0 {
            return PerformanceData::default();
        }

        let successes = recent.iter().filter(|m| m.is_success()).count();
        let cache_hits = recent.iter().filter(|m| m.cache_hit).count();
        let total_ms: f64 = recent.iter().map(|m| millis(m.duration)).sum();

        let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
        for m in &recent {
            let slot = groups
                .entry(format!("{} {}", m.method, m.endpoint))
                .or_insert((0.0, 0));
            slot.0 += millis(m.duration);
            slot.1 += 1;
        }
        let mut slowest: Vec<EndpointTiming> = groups
            .into_iter()
            .map(|(endpoint, (sum, count))| EndpointTiming {
                endpoint,
                average_time_ms: sum / count as f64,
                request_count: count,
            })
            .collect();
        slowest.sort_by(|a, b| {
            b.average_time_ms
                .total_cmp(&a.average_time_ms)
                .then_with(|| a.endpoint.cmp(&b.endpoint))
        });
        slowest.truncate(SLOWEST_ENDPOINTS);

        let n = total as f64;
        PerformanceData {
            total_requests: total,
            average_response_time_ms: total_ms / n,
            success_rate: successes as f64 / n,
            cache_hit_rate: cache_hits as f64 / n,
            error_rate: (total - successes) as f64 / n,
            slowest_endpoints: slowest,
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
