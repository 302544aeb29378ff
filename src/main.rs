//! Mail Health Exporter - Main Application
//!
//! Probes mail deliverability between two mail systems and serves the
//! results on /metrics and /status.

use clap::Parser;
use mail_health_exporter::{app::App, cli::Cli, error::AppError};
use std::{error::Error, process};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    if let Err(e) = App::new(cli).run().await {
        eprintln!("Error: {}", e);

        if let Some(source) = e.source() {
            eprintln!("Caused by: {}", source);
        }

        // Print suggestions for common errors
        print_error_suggestions(&e);

        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions based on error type
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Run with --print-env-template to list every supported variable");
            eprintln!("  - Passwords go to <secrets dir>/internal_email_password and");
            eprintln!("    <secrets dir>/external_email_password, or to the upper-cased variables");
            eprintln!("  - STATUS_HTML_FILE must point to an existing HTML template");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("I/O troubleshooting:");
            eprintln!("  - Check that HTTP_PORT is free and allowed for this user");
        }
        _ => {}
    }
}
