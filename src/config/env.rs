//! Environment variable handling, .env file loading and secret lookup

use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Snapshot of environment variables the parser reads from
pub type EnvVars = HashMap<String, String>;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load an env file if it exists. Variables already set in the process win.
    pub fn load_env_file(path: &Path) -> Result<bool> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No env file found, using process environment");
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load env file {}: {}", path.display(), e)))?;

        Ok(true)
    }

    /// Capture the current process environment
    pub fn capture() -> EnvVars {
        std::env::vars().collect()
    }

    /// Read a secret from `<secrets_dir>/<name>`, falling back to the
    /// upper-cased environment variable. Blank values count as missing.
    pub fn read_secret(name: &str, secrets_dir: &Path, vars: &EnvVars) -> Result<Option<String>> {
        let secret_path = secrets_dir.join(name);
        if secret_path.is_file() {
            let value = std::fs::read_to_string(&secret_path).map_err(|e| {
                AppError::config(format!("Failed to read secret {}: {}", secret_path.display(), e))
            })?;
            let value = value.trim();
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
        }

        Ok(vars
            .get(&name.to_uppercase())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }

    /// Interpret a boolean flag the lenient way: `true`, `1` and `yes` are true
    pub fn parse_flag(value: &str) -> bool {
        matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# Mail Health Exporter Configuration\n\
             #\n\
             # Values set in the process environment take precedence over this file.\n\
             # Passwords are read from /run/secrets/<name> first, then from the\n\
             # upper-cased variable (INTERNAL_EMAIL_PASSWORD, EXTERNAL_EMAIL_PASSWORD).\n\n",
        );

        for (var, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n{}={}\n\n", description, var, example));
        }

        content
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("INTERNAL_SMTP_SERVER", "Submission server of the internal mail system (required)", "smtp.internal.example"),
            ("INTERNAL_SMTP_PORT", "Submission port", "465"),
            ("INTERNAL_SMTP_USE_TLS", "Use TLS (implicit on 465, STARTTLS otherwise)", "true"),
            ("INTERNAL_IMAP_SERVER", "IMAP server of the internal mail system (required)", "imap.internal.example"),
            ("INTERNAL_IMAP_PORT", "IMAP port", "993"),
            ("INTERNAL_IMAP_USE_SSL", "Use implicit TLS for IMAP", "true"),
            ("INTERNAL_EMAIL_ADDRESS", "Probe account on the internal mail system (required)", "probe@internal.example"),
            ("EXTERNAL_SMTP_SERVER", "Submission server of the external mail system (required)", "smtp.external.example"),
            ("EXTERNAL_SMTP_PORT", "Submission port", "465"),
            ("EXTERNAL_SMTP_USE_TLS", "Use TLS (implicit on 465, STARTTLS otherwise)", "true"),
            ("EXTERNAL_IMAP_SERVER", "IMAP server of the external mail system (required)", "imap.external.example"),
            ("EXTERNAL_IMAP_PORT", "IMAP port", "993"),
            ("EXTERNAL_IMAP_USE_SSL", "Use implicit TLS for IMAP", "true"),
            ("EXTERNAL_EMAIL_ADDRESS", "Probe account on the external mail system (required)", "probe@external.example"),
            ("SPAM_SCORE_TEST_EMAIL_ADDRESS", "Intake address of the spam scoring service (required)", "test-xyz@srv1.mail-tester.com"),
            ("SPAM_SCORE_TEST_URL", "Report page of the spam scoring service (required)", "https://www.mail-tester.com/test-xyz"),
            ("CHECK_INTERVAL_SECONDS", "Pause between two checks in seconds", "300"),
            ("TIMEOUT_SECONDS", "Deadline for a test message to arrive in seconds", "60"),
            ("HTTP_PORT", "Port of the /metrics and /status server", "9091"),
            ("LOG_LEVEL", "TRACE, DEBUG, INFO, WARNING or ERROR", "INFO"),
            ("STATUS_HTML_FILE", "HTML template served on /status", "status.html"),
        ]
    }
}
