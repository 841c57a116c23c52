//! Synthetic load generation and latency aggregation.

pub mod load;
pub mod stats;
pub mod target;

pub use load::{instantaneous_rate, LoadGenerator, LoadSettings};
pub use stats::{LatencySummary, RequestOutcome, StatsAggregator};
pub use target::{HttpTarget, TargetClient};
