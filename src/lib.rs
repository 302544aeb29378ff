//! Mail Health Exporter
//!
//! Continuously verifies end-to-end mail deliverability between an internal
//! and an external mail system, samples a third-party spam scoring service,
//! and exports the results as Prometheus metrics and an HTML status page.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod server;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, Counter, Gauge, MetricsSnapshot, ProbeEndpoint, StatusData};
pub use client::{MailTransport, NetworkMailTransport, PollPolicy, TestMessage};
pub use executor::{CycleReport, RateLimiter, RoundTripProbe, Scheduler, SpamScoreProbe};
pub use output::{render_metrics, StatusTemplate};
pub use store::MetricsStore;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values and fixed timings
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_HTTP_PORT: u16 = 9091;
    pub const DEFAULT_SMTP_PORT: u16 = 465;
    pub const DEFAULT_IMAP_PORT: u16 = 993;
    pub const DEFAULT_STATUS_HTML_FILE: &str = "status.html";
    pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

    /// Pause between two mailbox polls
    pub const POLL_BACKOFF: Duration = Duration::from_secs(10);
    /// Pause after a tick that failed unexpectedly
    pub const RECOVERY_DELAY: Duration = Duration::from_secs(30);
    /// Minimum spacing of spam score checks
    pub const SPAM_SCORE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
    /// Upper bound for serving a single HTTP request
    pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Every probe subject starts with this, followed by ` - <id>`
    pub const SUBJECT_PREFIX: &str = "Mail Health Exporter";
}
