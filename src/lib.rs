pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod simulator;

pub use error::{Result, ToolkitError};
