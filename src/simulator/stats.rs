use crate::models::SimulationResult;

/// Result of a single synthetic request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestOutcome {
    /// The target answered; `latency_ms` is the full round trip.
    Response { status: u16, latency_ms: f64 },
    /// No HTTP response at all (connect failure, timeout, reset).
    TransportError,
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Response { status: 200, .. })
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            RequestOutcome::Response { latency_ms, .. } => Some(*latency_ms),
            RequestOutcome::TransportError => None,
        }
    }
}

/// Latency distribution over a set of samples, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencySummary {
    /// All fields are zero for an empty sample set.
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        samples.sort_by(|a, b| a.total_cmp(b));
        let sum: f64 = samples.iter().sum();

        Self {
            avg: sum / samples.len() as f64,
            min: samples[0],
            max: samples[samples.len() - 1],
            p95: nearest_rank(&samples, 0.95),
            p99: nearest_rank(&samples, 0.99),
        }
    }
}

/// `sorted[floor(p * n)]`, clamped to the last element. No interpolation.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Accumulates request outcomes and resource samples over one run.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    latencies: Vec<f64>,
    successful: i64,
    failed: i64,
    cpu_usage: f64,
    memory_usage: f64,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: RequestOutcome) {
        if outcome.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        if let Some(latency) = outcome.latency_ms() {
            self.latencies.push(latency);
        }
    }

    /// Replaces the resource sample; the last tick's reading is reported.
    pub fn record_resource_usage(&mut self, cpu_usage: f64, memory_usage: f64) {
        self.cpu_usage = cpu_usage;
        self.memory_usage = memory_usage;
    }

    pub fn total(&self) -> i64 {
        self.successful + self.failed
    }

    pub fn finish(self) -> SimulationResult {
        let total_requests = self.total();
        let summary = LatencySummary::from_samples(self.latencies);

        SimulationResult {
            total_requests,
            successful_requests: self.successful,
            failed_requests: self.failed,
            avg_response_time: summary.avg,
            max_response_time: summary.max,
            min_response_time: summary.min,
            p95_response_time: summary.p95,
            p99_response_time: summary.p99,
            cpu_usage: self.cpu_usage,
            memory_usage: self.memory_usage,
        }
    }
}
