//! Periodic metric collection with bounded retention and threshold alerting.

pub mod alerts;
pub mod collector;
pub mod store;

pub use alerts::{AlertEngine, ThresholdRule};
pub use collector::MetricCollector;
pub use store::{AlertStore, BoundedRing, MetricStore};
