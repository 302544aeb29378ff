//! Data models and structures for the mail health exporter

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::{Config, Credential, ProbeEndpoint, ServerSettings, SpamScoreSettings};
pub use metrics::{Counter, Gauge, LastUpdated, MetricsSnapshot, StatusData, Step, METRIC_PREFIX};
