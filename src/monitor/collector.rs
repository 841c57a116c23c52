use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{AlertScope, MonitorConfig};
use crate::metrics::record_collection_tick;
use crate::models::Metric;
use crate::monitor::alerts::AlertEngine;
use crate::monitor::store::MetricStore;

pub const CPU_USAGE: &str = "cpu_usage";
pub const MEMORY_USAGE: &str = "memory_usage";

/// Background sampler. It is the only writer of the metric store and,
/// through its engine, of the alert store.
pub struct MetricCollector {
    store: Arc<MetricStore>,
    engine: AlertEngine,
    interval: Duration,
    scope: AlertScope,
}

impl MetricCollector {
    pub fn new(store: Arc<MetricStore>, engine: AlertEngine, config: &MonitorConfig) -> Self {
        Self {
            store,
            engine,
            interval: config.interval,
            scope: config.alert_scope,
        }
    }

    /// Synthesizes one batch of readings. Values are uniform in [0, 100].
    pub fn sample() -> Vec<Metric> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        vec![
            Metric::new(CPU_USAGE, rng.gen_range(0.0..=100.0), now),
            Metric::new(MEMORY_USAGE, rng.gen_range(0.0..=100.0), now),
        ]
    }

    /// Runs one tick: sample, store, alert. Returns the new batch.
    pub fn collect_once(&self) -> Vec<Metric> {
        let batch = Self::sample();
        self.store.extend(batch.iter().cloned());

        let fired = match self.scope {
            AlertScope::Batch => self.engine.record(&batch),
            AlertScope::FullHistory => self.engine.record(&self.store.snapshot()),
        };

        record_collection_tick(self.store.len(), self.engine.store().len());
        debug!(
            samples = batch.len(),
            alerts = fired.len(),
            retained = self.store.len(),
            "collection tick"
        );
        batch
    }

    /// Collects on every interval until `shutdown` fires. The first tick
    /// happens immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs_f64(), scope = ?self.scope, "metric collector started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.collect_once();
                }
            }
        }

        info!("metric collector stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::store::AlertStore;

    fn collector(scope: AlertScope) -> (MetricCollector, Arc<MetricStore>) {
        let store = Arc::new(MetricStore::new(10));
        let engine = AlertEngine::new(Arc::new(AlertStore::new(100)));
        let config = MonitorConfig {
            metric_capacity: 10,
            alert_scope: scope,
            ..Default::default()
        };
        (MetricCollector::new(store.clone(), engine, &config), store)
    }

    #[test]
    fn test_sample_produces_cpu_and_memory_in_range() {
        for _ in 0..200 {
            let batch = MetricCollector::sample();
            assert_eq!(batch.len(), 2);
            assert_eq!(batch[0].name, CPU_USAGE);
            assert_eq!(batch[1].name, MEMORY_USAGE);
            assert!(batch.iter().all(|m| (0.0..=100.0).contains(&m.value)));
            assert_eq!(batch[0].timestamp, batch[1].timestamp);
        }
    }

    #[test]
    fn test_collect_once_appends_batch() {
        let (collector, store) = collector(AlertScope::Batch);
        let batch = collector.collect_once();
        assert_eq!(store.snapshot(), batch);

        for _ in 0..20 {
            collector.collect_once();
        }
        assert_eq!(store.len(), 10);
        let timestamps: Vec<_> = store.snapshot().iter().map(|m| m.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_batch_scope_ignores_old_breaches() {
        let (collector, store) = collector(AlertScope::Batch);
        store.push(Metric::new(CPU_USAGE, 99.0, Utc::now()));

        let mut expected = 0;
        for _ in 0..3 {
            let batch = collector.collect_once();
            expected += collector.engine.evaluate(&batch).len();
        }
        assert_eq!(collector.engine.store().len(), expected);
    }

    #[test]
    fn test_full_history_scope_realerts_on_old_breaches() {
        let (collector, store) = collector(AlertScope::FullHistory);
        store.push(Metric::new(CPU_USAGE, 99.0, Utc::now()));

        collector.collect_once();
        collector.collect_once();
        let old_breach_alerts = collector
            .engine
            .store()
            .snapshot()
            .iter()
            .filter(|a| a.value == 99.0)
            .count();
        assert_eq!(old_breach_alerts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancellation() {
        let (collector, store) = collector(AlertScope::Batch);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(collector.run(shutdown.clone()));

        // Ticks at 0s, 5s and 10s.
        tokio::time::sleep(Duration::from_secs(11)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(store.len(), 6);
    }
}
