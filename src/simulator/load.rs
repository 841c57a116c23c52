use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::SimulatorConfig;
use crate::metrics::{record_simulated_request, record_simulation};
use crate::models::{SimulationConfig, SimulationResult};
use crate::simulator::stats::{RequestOutcome, StatsAggregator};
use crate::simulator::target::TargetClient;

/// Requests per second for the given wall-clock second. The load follows a
/// slow sine wave with a period of roughly 6.3 hours. Never negative.
pub fn instantaneous_rate(users_per_sec: f64, peak_factor: f64, unix_secs: i64) -> f64 {
    let modulation = 1.0 + peak_factor * (unix_secs as f64 / 3600.0).sin();
    (users_per_sec * modulation).max(0.0)
}

/// Synthetic host readings for one tick: CPU percent and memory in MB.
pub fn sample_resource_usage() -> (f64, f64) {
    let mut rng = rand::thread_rng();
    (rng.gen_range(30.0..=70.0), rng.gen_range(200.0..=300.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSettings {
    pub tick: Duration,
    pub max_concurrency: usize,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self::from(&SimulatorConfig::default())
    }
}

impl From<&SimulatorConfig> for LoadSettings {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            tick: config.tick,
            max_concurrency: config.max_concurrency.max(1),
        }
    }
}

pub struct LoadGenerator {
    target: Arc<dyn TargetClient>,
    settings: LoadSettings,
}

/// How a tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickEnd {
    Completed,
    Cancelled,
    Expired,
}

/// Resolves at `deadline`, or never when the run is unbounded.
async fn expire_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl LoadGenerator {
    pub fn new(target: Arc<dyn TargetClient>, settings: LoadSettings) -> Self {
        Self { target, settings }
    }

    /// Drives load for `config.duration` minutes, or until `cancel` fires.
    /// A cancelled run still returns the statistics gathered so far.
    pub async fn run(&self, config: &SimulationConfig, cancel: CancellationToken) -> SimulationResult {
        let run_for = Duration::from_secs(config.duration.saturating_mul(60));
        self.run_for(config, run_for, cancel).await
    }

    /// Same as [`LoadGenerator::run`] with an explicit run length.
    pub async fn run_for(
        &self,
        config: &SimulationConfig,
        run_for: Duration,
        cancel: CancellationToken,
    ) -> SimulationResult {
        let run_id = Uuid::new_v4();
        let span = info_span!("simulation", %run_id, target = %self.target.describe());
        self.drive(config, run_for, cancel).instrument(span).await
    }

    async fn drive(
        &self,
        config: &SimulationConfig,
        run_for: Duration,
        cancel: CancellationToken,
    ) -> SimulationResult {
        info!(
            run_secs = run_for.as_secs_f64(),
            users_per_sec = config.users_per_sec,
            peak_factor = config.peak_factor,
            "simulation started"
        );

        let mut stats = StatsAggregator::new();
        // A run length past the clock's range has no deadline.
        let deadline = Instant::now().checked_add(run_for);
        let mut cancelled = false;
        let mut ticks = 0u64;

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            let tick_started = Instant::now();
            let rate = instantaneous_rate(config.users_per_sec, config.peak_factor, Utc::now().timestamp());
            let requests = rate.floor() as usize;

            let end = self.run_tick(requests, &mut stats, &cancel, deadline).await;
            let (cpu, memory) = sample_resource_usage();
            stats.record_resource_usage(cpu, memory);
            ticks += 1;
            debug!(tick = ticks, rate, requests, ?end, "tick complete");

            match end {
                TickEnd::Completed => {}
                TickEnd::Cancelled => {
                    cancelled = true;
                    break;
                }
                TickEnd::Expired => break,
            }

            let next_tick = tick_started
                .checked_add(self.settings.tick)
                .map(|next| deadline.map_or(next, |deadline| next.min(deadline)));
            tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = expire_at(next_tick) => {}
            }
        }

        let result = stats.finish();
        record_simulation(cancelled);

        if config.response_time > 0 && result.p95_response_time > config.response_time as f64 {
            warn!(
                p95_ms = result.p95_response_time,
                target_ms = config.response_time,
                "p95 response time above target"
            );
        }
        info!(
            ticks,
            cancelled,
            total = result.total_requests,
            failed = result.failed_requests,
            avg_ms = result.avg_response_time,
            p99_ms = result.p99_response_time,
            "simulation finished"
        );

        result
    }

    /// Issues `requests` probes over a bounded worker pool and waits for all
    /// of them. Cancellation or the run deadline drops whatever is still in
    /// flight; completed outcomes are already recorded.
    async fn run_tick(
        &self,
        requests: usize,
        stats: &mut StatsAggregator,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> TickEnd {
        if cancel.is_cancelled() {
            return TickEnd::Cancelled;
        }
        if requests == 0 {
            return TickEnd::Completed;
        }

        let workers = requests.min(self.settings.max_concurrency);
        let mut in_flight = stream::iter(0..requests)
            .map(|_| self.issue())
            .buffer_unordered(workers);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return TickEnd::Cancelled,
                _ = expire_at(deadline) => return TickEnd::Expired,
                next = in_flight.next() => match next {
                    Some(outcome) => stats.record(outcome),
                    None => return TickEnd::Completed,
                },
            }
        }
    }

    async fn issue(&self) -> RequestOutcome {
        let started = Instant::now();
        match self.target.probe().await {
            Ok(status) => {
                let latency = started.elapsed().as_secs_f64();
                let outcome = RequestOutcome::Response {
                    status,
                    latency_ms: latency * 1000.0,
                };
                if !outcome.is_success() {
                    debug!(status, "target returned non-200 status");
                }
                record_simulated_request(outcome.is_success(), Some(latency));
                outcome
            }
            Err(e) => {
                debug!(error = %e, "synthetic request failed");
                record_simulated_request(false, None);
                RequestOutcome::TransportError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_without_peak_factor_is_flat() {
        for t in [0, 1_000, 1_700_000_000] {
            assert_eq!(instantaneous_rate(7.0, 0.0, t), 7.0);
        }
    }

    #[test]
    fn test_rate_follows_sine() {
        // sin(pi/2) == 1 at t = 3600 * pi / 2
        let t = (3600.0 * std::f64::consts::FRAC_PI_2).round() as i64;
        let rate = instantaneous_rate(10.0, 0.5, t);
        assert!((rate - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_rate_is_clamped_at_zero() {
        // sin(3pi/2) == -1, so a peak factor above one would go negative.
        let t = (3600.0 * 3.0 * std::f64::consts::FRAC_PI_2).round() as i64;
        assert_eq!(instantaneous_rate(10.0, 2.0, t), 0.0);
    }

    #[test]
    fn test_resource_usage_ranges() {
        for _ in 0..200 {
            let (cpu, memory) = sample_resource_usage();
            assert!((30.0..=70.0).contains(&cpu));
            assert!((200.0..=300.0).contains(&memory));
        }
    }
}
