//! Configuration validation utilities and rules

use crate::{
    defaults::POLL_BACKOFF,
    error::Result,
    models::Config,
};
use std::fmt;

/// Configuration validator with advisory checks on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        // Hard errors first
        config.validate()?;

        warnings.extend(Self::validate_transport_security(config));
        warnings.extend(Self::validate_timing(config));
        warnings.extend(Self::validate_report_url(config));

        Ok(warnings)
    }

    fn validate_transport_security(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for endpoint in [&config.internal, &config.external] {
            for (kind, server) in [("SMTP", &endpoint.submission), ("IMAP", &endpoint.mailbox)] {
                if !server.security.is_encrypted() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!(
                            "{} {} server {} is used without TLS, credentials are sent in clear text",
                            endpoint.side, kind, server.host
                        ),
                    ));
                }
            }

            if endpoint.submission.port == 465 && !endpoint.submission.security.is_encrypted() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("{} SMTP port 465 normally expects implicit TLS", endpoint.side),
                ));
            }
        }

        warnings
    }

    fn validate_timing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.timeout() < POLL_BACKOFF {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s is shorter than the {}s poll backoff, each mailbox is checked only once",
                    config.timeout_seconds,
                    POLL_BACKOFF.as_secs()
                ),
            ));
        }

        // Both directions may each wait for the full timeout
        let worst_case_cycle = config.timeout_seconds * 2;
        if worst_case_cycle > config.check_interval_seconds {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "A failing check can take {}s, longer than the {}s check interval",
                    worst_case_cycle, config.check_interval_seconds
                ),
            ));
        }

        warnings
    }

    fn validate_report_url(config: &Config) -> Vec<ValidationWarning> {
        match url::Url::parse(&config.spam_score.report_url) {
            Ok(parsed) if parsed.scheme() == "http" => vec![ValidationWarning::new(
                ValidationLevel::Info,
                format!("Spam score report URL '{}' uses HTTP instead of HTTPS", config.spam_score.report_url),
            )],
            _ => Vec::new(),
        }
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

/// Validation warning with level and message
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Emit the warning through the log
    pub fn log(&self) {
        match self.level {
            ValidationLevel::Info => tracing::info!("Configuration note: {}", self.message),
            ValidationLevel::Warning => tracing::warn!("Configuration warning: {}", self.message),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.level {
            ValidationLevel::Info => "INFO",
            ValidationLevel::Warning => "WARNING",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

/// Convenience function for comprehensive validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
