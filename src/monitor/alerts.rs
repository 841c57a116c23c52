use std::sync::Arc;
use tracing::warn;

use crate::metrics::record_alert;
use crate::models::{Alert, Metric, Severity};
use crate::monitor::store::AlertStore;

/// Fires when the named metric is strictly above `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub metric: String,
    pub threshold: f64,
    pub severity: Severity,
    pub message: String,
}

impl ThresholdRule {
    pub fn new(metric: &str, threshold: f64, severity: Severity, message: &str) -> Self {
        Self {
            metric: metric.to_string(),
            threshold,
            severity,
            message: message.to_string(),
        }
    }

    pub fn check(&self, metric: &Metric) -> Option<Alert> {
        if metric.name == self.metric && metric.value > self.threshold {
            Some(Alert {
                severity: self.severity,
                message: self.message.clone(),
                metric: metric.name.clone(),
                value: metric.value,
            })
        } else {
            None
        }
    }
}

pub fn default_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule::new("cpu_usage", 80.0, Severity::Warning, "High CPU usage detected"),
        ThresholdRule::new("memory_usage", 90.0, Severity::Critical, "Critical memory usage"),
    ]
}

#[derive(Debug, Clone)]
pub struct AlertEngine {
    rules: Vec<ThresholdRule>,
    store: Arc<AlertStore>,
}

impl AlertEngine {
    pub fn new(store: Arc<AlertStore>) -> Self {
        Self::with_rules(store, default_rules())
    }

    pub fn with_rules(store: Arc<AlertStore>, rules: Vec<ThresholdRule>) -> Self {
        Self { rules, store }
    }

    /// Every (metric, rule) pair that matches yields one alert, in metric order.
    pub fn evaluate(&self, metrics: &[Metric]) -> Vec<Alert> {
        metrics
            .iter()
            .flat_map(|metric| self.rules.iter().filter_map(move |rule| rule.check(metric)))
            .collect()
    }

    /// Evaluates `metrics` and appends whatever fired to the alert store.
    pub fn record(&self, metrics: &[Metric]) -> Vec<Alert> {
        let fired = self.evaluate(metrics);
        for alert in &fired {
            warn!(
                severity = alert.severity.as_str(),
                metric = %alert.metric,
                value = alert.value,
                "{}", alert.message
            );
            record_alert(alert.severity.as_str());
        }
        if !fired.is_empty() {
            self.store.extend(fired.iter().cloned());
        }
        fired
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }
}
