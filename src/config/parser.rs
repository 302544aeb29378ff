//! Configuration parsing from environment variables, secrets and CLI arguments

use crate::{
    cli::Cli,
    config::env::{EnvManager, EnvVars},
    config::validation::{ConfigValidator, ValidationLevel, ValidationWarning},
    error::{AppError, Result},
    logging::LogLevel,
    models::{Config, Credential, ProbeEndpoint, ServerSettings, SpamScoreSettings},
    types::{Side, TransportSecurity},
};
use std::path::PathBuf;
use std::str::FromStr;

/// Variables without a default
pub const REQUIRED_VARS: &[&str] = &[
    "INTERNAL_SMTP_SERVER",
    "INTERNAL_IMAP_SERVER",
    "INTERNAL_EMAIL_ADDRESS",
    "EXTERNAL_SMTP_SERVER",
    "EXTERNAL_IMAP_SERVER",
    "EXTERNAL_EMAIL_ADDRESS",
    "SPAM_SCORE_TEST_EMAIL_ADDRESS",
    "SPAM_SCORE_TEST_URL",
];

/// Secrets without a default, looked up as files first and variables second
pub const REQUIRED_SECRETS: &[&str] = &["internal_email_password", "external_email_password"];

/// Configuration plus the non-fatal findings made while building it
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<ValidationWarning>,
}

/// Configuration parser that combines the environment with CLI arguments
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Load the env file, capture the process environment and build the configuration
    pub fn parse(&self) -> Result<LoadedConfig> {
        EnvManager::load_env_file(&self.cli.env_file)?;
        let vars = EnvManager::capture();
        self.parse_vars(&vars)
    }

    /// Build the configuration from an explicit set of variables
    pub fn parse_vars(&self, vars: &EnvVars) -> Result<LoadedConfig> {
        let mut warnings = Vec::new();

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| value(vars, name).is_none())
            .collect();

        let internal_password = EnvManager::read_secret(REQUIRED_SECRETS[0], &self.cli.secrets_dir, vars)?;
        let external_password = EnvManager::read_secret(REQUIRED_SECRETS[1], &self.cli.secrets_dir, vars)?;
        let missing_secrets: Vec<&str> = REQUIRED_SECRETS
            .iter()
            .zip([&internal_password, &external_password])
            .filter(|(_, secret)| secret.is_none())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() || !missing_secrets.is_empty() {
            let mut parts = Vec::new();
            if !missing.is_empty() {
                parts.push(format!("Missing required environment variables: {}", missing.join(", ")));
            }
            if !missing_secrets.is_empty() {
                parts.push(format!("Missing required secrets: {}", missing_secrets.join(", ")));
            }
            return Err(AppError::config(parts.join("; ")));
        }

        let internal = parse_endpoint(vars, Side::Internal, Credential::new(internal_password.unwrap_or_default()))?;
        let external = parse_endpoint(vars, Side::External, Credential::new(external_password.unwrap_or_default()))?;

        let level_name = self
            .cli
            .log_level
            .clone()
            .or_else(|| value(vars, "LOG_LEVEL").map(str::to_string));
        let log_level = match level_name {
            Some(name) => LogLevel::from_str(&name).unwrap_or_else(|_| {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Unknown log level '{}', falling back to INFO", name),
                ));
                LogLevel::Info
            }),
            None => LogLevel::default(),
        };

        let config = Config {
            internal,
            external,
            spam_score: SpamScoreSettings {
                intake_address: required(vars, "SPAM_SCORE_TEST_EMAIL_ADDRESS")?,
                report_url: required(vars, "SPAM_SCORE_TEST_URL")?,
            },
            check_interval_seconds: number(
                vars,
                "CHECK_INTERVAL_SECONDS",
                crate::defaults::DEFAULT_CHECK_INTERVAL.as_secs(),
            )?,
            timeout_seconds: number(vars, "TIMEOUT_SECONDS", crate::defaults::DEFAULT_TIMEOUT.as_secs())?,
            http_port: number(vars, "HTTP_PORT", crate::defaults::DEFAULT_HTTP_PORT)?,
            log_level,
            status_html_file: value(vars, "STATUS_HTML_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(crate::defaults::DEFAULT_STATUS_HTML_FILE)),
        };

        warnings.extend(ConfigValidator::validate_comprehensive(&config)?);

        Ok(LoadedConfig { config, warnings })
    }
}

fn value<'a>(vars: &'a EnvVars, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required(vars: &EnvVars, name: &str) -> Result<String> {
    value(vars, name)
        .map(str::to_string)
        .ok_or_else(|| AppError::config(format!("Missing required environment variable: {}", name)))
}

fn number<T>(vars: &EnvVars, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value(vars, name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", name, raw, e))),
        None => Ok(default),
    }
}

fn flag(vars: &EnvVars, name: &str, default: bool) -> bool {
    value(vars, name).map(EnvManager::parse_flag).unwrap_or(default)
}

fn parse_endpoint(vars: &EnvVars, side: Side, credential: Credential) -> Result<ProbeEndpoint> {
    let prefix = side.as_str().to_uppercase();
    let var = |suffix: &str| format!("{}_{}", prefix, suffix);

    let smtp_port = number(vars, &var("SMTP_PORT"), crate::defaults::DEFAULT_SMTP_PORT)?;
    let smtp_use_tls = flag(vars, &var("SMTP_USE_TLS"), true);
    let imap_port = number(vars, &var("IMAP_PORT"), crate::defaults::DEFAULT_IMAP_PORT)?;
    let imap_use_ssl = flag(vars, &var("IMAP_USE_SSL"), true);

    Ok(ProbeEndpoint {
        side,
        address: required(vars, &var("EMAIL_ADDRESS"))?,
        credential,
        submission: ServerSettings::new(
            required(vars, &var("SMTP_SERVER"))?,
            smtp_port,
            TransportSecurity::for_submission(smtp_use_tls, smtp_port),
        ),
        mailbox: ServerSettings::new(
            required(vars, &var("IMAP_SERVER"))?,
            imap_port,
            TransportSecurity::for_mailbox(imap_use_ssl),
        ),
    })
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<LoadedConfig> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    for endpoint in [&config.internal, &config.external] {
        summary.push(format!("{} address: {}", endpoint.side, endpoint.address));
        summary.push(format!("{} SMTP: {}", endpoint.side, endpoint.submission));
        summary.push(format!("{} IMAP: {}", endpoint.side, endpoint.mailbox));
    }
    summary.push(format!("Spam score intake: {}", config.spam_score.intake_address));
    summary.push(format!("Spam score report: {}", config.spam_score.report_url));
    summary.push(format!("Check interval: {}s", config.check_interval_seconds));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("HTTP port: {}", config.http_port));
    summary.push(format!("Log level: {}", config.log_level));
    summary.push(format!("Status template: {}", config.status_html_file.display()));

    summary.join("\n")
}
