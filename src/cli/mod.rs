//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Mail Health Exporter - probes mail deliverability and exports the results as metrics
///
/// Mail servers, addresses and timings are configured through environment
/// variables (see --print-env-template).
#[derive(Parser, Debug, Clone)]
#[command(name = "mail-health-exporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Env file loaded before reading the configuration, if it exists
    #[arg(long, value_name = "PATH", default_value = ".env")]
    pub env_file: PathBuf,

    /// Directory holding mounted password files
    #[arg(long, value_name = "DIR", env = "SECRETS_DIR", default_value = crate::defaults::DEFAULT_SECRETS_DIR)]
    pub secrets_dir: PathBuf,

    /// Override LOG_LEVEL (TRACE, DEBUG, INFO, WARNING, ERROR)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Run a single check, print the metrics and exit
    #[arg(long)]
    pub once: bool,

    /// Print an example env file and exit
    #[arg(long)]
    pub print_env_template: bool,
}

impl Cli {
    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command line:\n");
        summary.push_str(&format!("  Env file: {}\n", self.env_file.display()));
        summary.push_str(&format!("  Secrets dir: {}\n", self.secrets_dir.display()));
        if let Some(ref level) = self.log_level {
            summary.push_str(&format!("  Log level override: {}\n", level));
        }
        summary.push_str(&format!("  Single run: {}\n", self.once));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["mail-health-exporter"]);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert!(cli.log_level.is_none());
        assert!(!cli.once);
        assert!(!cli.print_env_template);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "mail-health-exporter",
            "--env-file",
            "/etc/mhe.env",
            "--secrets-dir",
            "/tmp/secrets",
            "--log-level",
            "debug",
            "--once",
        ]);
        assert_eq!(cli.env_file, PathBuf::from("/etc/mhe.env"));
        assert_eq!(cli.secrets_dir, PathBuf::from("/tmp/secrets"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.once);

        let summary = cli.get_config_summary();
        assert!(summary.contains("/etc/mhe.env"));
        assert!(summary.contains("Log level override: debug"));
    }
}
