use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, ToolkitError};

/// A single resource reading produced by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// A fired threshold rule. Alerts are an append-only log; they are never
/// resolved or deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
    pub metric: String,
    pub value: f64,
}

/// Longest accepted run, one day.
pub const MAX_DURATION_MINUTES: u64 = 24 * 60;

/// Parameters of one load simulation run, as posted by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Run length in minutes. Zero is a no-op run.
    pub duration: u64,
    pub users_per_sec: f64,
    /// Accepted for trend projection by the caller; not applied within a run.
    pub growth_rate: f64,
    pub peak_factor: f64,
    /// Target response time in milliseconds, zero disables the check.
    pub response_time: u64,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.duration > MAX_DURATION_MINUTES {
            return Err(ToolkitError::Validation(format!(
                "duration must be at most {} minutes, got {}",
                MAX_DURATION_MINUTES, self.duration
            )));
        }
        if !self.users_per_sec.is_finite() || self.users_per_sec < 0.0 {
            return Err(ToolkitError::Validation(format!(
                "users_per_sec must be a non-negative number, got {}",
                self.users_per_sec
            )));
        }
        if !self.peak_factor.is_finite() {
            return Err(ToolkitError::Validation("peak_factor must be finite".into()));
        }
        if !self.growth_rate.is_finite() {
            return Err(ToolkitError::Validation("growth_rate must be finite".into()));
        }
        Ok(())
    }
}

/// Summary of a finished (or cancelled) simulation run. Response times are
/// in milliseconds; `memory_usage` is in megabytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub total_requests: i64,
    pub successful_requests: i64,
    pub failed_requests: i64,
    pub avg_response_time: f64,
    pub max_response_time: f64,
    pub min_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
}
