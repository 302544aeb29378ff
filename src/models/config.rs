//! Configuration data model and validation

use crate::logging::LogLevel;
use crate::types::{AppError, Result, Side, TransportSecurity};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Password or app token for one mail account. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Host, port and security mode of one mail server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub security: TransportSecurity,
}

impl ServerSettings {
    pub fn new<S: Into<String>>(host: S, port: u16, security: TransportSecurity) -> Self {
        Self {
            host: host.into(),
            port,
            security,
        }
    }
}

impl fmt::Display for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.security)
    }
}

/// One side of the mail system: where to submit, where to poll, and as whom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEndpoint {
    pub side: Side,
    pub address: String,
    pub credential: Credential,
    pub submission: ServerSettings,
    pub mailbox: ServerSettings,
}

/// Third-party spam scoring service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamScoreSettings {
    /// Address the probe message is sent to
    pub intake_address: String,
    /// Page carrying the score for the last message received
    pub report_url: String,
}

/// Main application configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub internal: ProbeEndpoint,
    pub external: ProbeEndpoint,
    pub spam_score: SpamScoreSettings,
    /// Pause between two checks
    pub check_interval_seconds: u64,
    /// Deadline for a test message to arrive
    pub timeout_seconds: u64,
    /// Port the metrics and status server listens on
    pub http_port: u16,
    pub log_level: LogLevel,
    pub status_html_file: PathBuf,
}

impl Config {
    pub fn endpoint(&self, side: Side) -> &ProbeEndpoint {
        match side {
            Side::Internal => &self.internal,
            Side::External => &self.external,
        }
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// Validate the configuration and return the first hard error
    pub fn validate(&self) -> Result<()> {
        for endpoint in [&self.internal, &self.external] {
            if endpoint.address.trim().is_empty() {
                return Err(AppError::config(format!("{} email address cannot be empty", endpoint.side)));
            }
            if !endpoint.address.contains('@') {
                return Err(AppError::config(format!(
                    "Invalid {} email address: {}",
                    endpoint.side, endpoint.address
                )));
            }
            for (kind, server) in [("SMTP", &endpoint.submission), ("IMAP", &endpoint.mailbox)] {
                if server.host.trim().is_empty() {
                    return Err(AppError::config(format!("{} {} server cannot be empty", endpoint.side, kind)));
                }
                if server.port == 0 {
                    return Err(AppError::config(format!("{} {} port must be greater than 0", endpoint.side, kind)));
                }
            }
        }

        if !self.spam_score.intake_address.contains('@') {
            return Err(AppError::config(format!(
                "Invalid spam score test address: {}",
                self.spam_score.intake_address
            )));
        }

        match url::Url::parse(&self.spam_score.report_url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            Ok(parsed) => {
                return Err(AppError::config(format!(
                    "Spam score test URL must use HTTP or HTTPS, got scheme '{}'",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid spam score test URL '{}': {}",
                    self.spam_score.report_url, e
                )));
            }
        }

        if self.check_interval_seconds == 0 {
            return Err(AppError::config("Check interval must be greater than 0"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.http_port == 0 {
            return Err(AppError::config("HTTP port must be greater than 0"));
        }

        Ok(())
    }
}
