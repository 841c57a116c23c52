//! Environment-driven service configuration.
//!
//! Every setting has a default, so an empty environment starts a monitor on
//! port 8081. Values that are present but unparseable abort startup.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::{Result, ToolkitError};

pub const DEFAULT_METRIC_CAPACITY: usize = 1000;
pub const DEFAULT_ALERT_CAPACITY: usize = 100;
pub const DEFAULT_TARGET_URL: &str = "http://localhost:8080/todos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Monitor,
    Simulator,
}

impl FromStr for Role {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monitor" => Ok(Role::Monitor),
            "simulator" => Ok(Role::Simulator),
            other => Err(ToolkitError::Config(format!(
                "SERVICE_ROLE must be 'monitor' or 'simulator', got '{}'",
                other
            ))),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Monitor => "monitor",
            Role::Simulator => "simulator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(ToolkitError::Config(format!(
                "LOG_FORMAT must be 'compact' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Which metrics the alert engine looks at on each collection tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertScope {
    /// Only the samples produced by the current tick.
    #[default]
    Batch,
    /// Everything retained in the store. Old breaches re-alert every tick.
    FullHistory,
}

impl FromStr for AlertScope {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(AlertScope::Batch),
            "full_history" => Ok(AlertScope::FullHistory),
            other => Err(ToolkitError::Config(format!(
                "ALERT_SCOPE must be 'batch' or 'full_history', got '{}'",
                other
            ))),
        }
    }
}

/// Top-level configuration for one process.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub role: Role,
    pub addr: SocketAddr,
    pub log_format: LogFormat,
    pub monitor: MonitorConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Time between collection ticks
    pub interval: Duration,
    pub metric_capacity: usize,
    pub alert_capacity: usize,
    pub alert_scope: AlertScope,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            metric_capacity: DEFAULT_METRIC_CAPACITY,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            alert_scope: AlertScope::Batch,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Endpoint hit by every synthetic request
    pub target_url: String,
    /// Length of one load tick
    pub tick: Duration,
    /// Upper bound on in-flight requests within a tick
    pub max_concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            tick: Duration::from_secs(1),
            max_concurrency: 256,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let role = parse_or(&lookup, "SERVICE_ROLE", Role::Monitor)?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8081)?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| ToolkitError::Config(format!("Invalid bind address {}:{}: {}", host, port, e)))?;

        let monitor = MonitorConfig {
            interval: Duration::from_secs(positive(&lookup, "COLLECTION_INTERVAL_SECS", 5)?),
            metric_capacity: positive(&lookup, "METRIC_CAPACITY", DEFAULT_METRIC_CAPACITY as u64)? as usize,
            alert_capacity: positive(&lookup, "ALERT_CAPACITY", DEFAULT_ALERT_CAPACITY as u64)? as usize,
            alert_scope: parse_or(&lookup, "ALERT_SCOPE", AlertScope::Batch)?,
        };

        let simulator = SimulatorConfig {
            target_url: lookup("TARGET_URL").unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
            tick: Duration::from_millis(positive(&lookup, "SIM_TICK_MILLIS", 1000)?),
            max_concurrency: positive(&lookup, "SIM_MAX_CONCURRENCY", 256)? as usize,
            request_timeout: Duration::from_secs(positive(&lookup, "SIM_REQUEST_TIMEOUT_SECS", 10)?),
        };

        Ok(Self {
            role,
            addr,
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Compact)?,
            monitor,
            simulator,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ToolkitError::Config(format!("Invalid {}='{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let value: u64 = parse_or(lookup, key, default)?;
    if value == 0 {
        return Err(ToolkitError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.role, Role::Monitor);
        assert_eq!(config.addr.port(), 8081);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.monitor, MonitorConfig::default());
        assert_eq!(config.simulator, SimulatorConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("SERVICE_ROLE", "Simulator"),
            ("PORT", "9000"),
            ("LOG_FORMAT", "json"),
            ("ALERT_SCOPE", "full_history"),
            ("SIM_TICK_MILLIS", "250"),
            ("TARGET_URL", "http://todo:8080/todos"),
        ]))
        .unwrap();

        assert_eq!(config.role, Role::Simulator);
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.monitor.alert_scope, AlertScope::FullHistory);
        assert_eq!(config.simulator.tick, Duration::from_millis(250));
        assert_eq!(config.simulator.target_url, "http://todo:8080/todos");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(ServiceConfig::from_lookup(lookup_from(&[("SERVICE_ROLE", "worker")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup_from(&[("METRIC_CAPACITY", "0")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup_from(&[("COLLECTION_INTERVAL_SECS", "-1")])).is_err());
    }
}
