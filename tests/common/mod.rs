//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use mail_health_exporter::{
    client::{subject_matches, MailTransport, TestMessage},
    error::{AppError, Result},
    logging::LogLevel,
    models::{Config, Credential, ProbeEndpoint, ServerSettings, SpamScoreSettings},
    types::{Side, TransportSecurity},
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const INTERNAL_ADDRESS: &str = "a@int";
pub const EXTERNAL_ADDRESS: &str = "b@ext";
pub const INTAKE_ADDRESS: &str = "test-abc@spam.example";
pub const PASSWORD: &str = "correct horse";
pub const WRONG_PASSWORD: &str = "wrong";

pub fn endpoint(side: Side, address: &str, password: &str) -> ProbeEndpoint {
    ProbeEndpoint {
        side,
        address: address.to_string(),
        credential: Credential::new(password),
        submission: ServerSettings::new(format!("smtp.{}", side), 465, TransportSecurity::ImplicitTls),
        mailbox: ServerSettings::new(format!("imap.{}", side), 993, TransportSecurity::ImplicitTls),
    }
}

/// Configuration with both sides using the given passwords
pub fn config_with(internal_password: &str, external_password: &str, report_url: &str) -> Config {
    Config {
        internal: endpoint(Side::Internal, INTERNAL_ADDRESS, internal_password),
        external: endpoint(Side::External, EXTERNAL_ADDRESS, external_password),
        spam_score: SpamScoreSettings {
            intake_address: INTAKE_ADDRESS.to_string(),
            report_url: report_url.to_string(),
        },
        check_interval_seconds: 300,
        timeout_seconds: 60,
        http_port: 9091,
        log_level: LogLevel::Info,
        status_html_file: PathBuf::from("status.html"),
    }
}

pub fn config() -> Config {
    config_with(PASSWORD, PASSWORD, "not-a-url")
}

#[derive(Debug, Clone)]
struct Stored {
    from: String,
    subject: String,
    visible_at: Instant,
}

/// In-memory mail system. Submissions with [`WRONG_PASSWORD`] fail
/// authentication; accepted messages become visible after the delivery delay.
#[derive(Default)]
pub struct InMemoryMail {
    delivery_delay: Duration,
    mailboxes: Mutex<HashMap<String, Vec<Stored>>>,
    submits: AtomicUsize,
    polls: AtomicUsize,
}

impl InMemoryMail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delivery_delay(delay: Duration) -> Self {
        Self {
            delivery_delay: delay,
            ..Self::default()
        }
    }

    /// Messages currently stored for `address`, delivered or not
    pub fn stored(&self, address: &str) -> usize {
        self.mailboxes
            .lock()
            .unwrap()
            .get(address)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for InMemoryMail {
    async fn submit(&self, sender: &ProbeEndpoint, message: &TestMessage) -> Result<()> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if sender.credential.expose() == WRONG_PASSWORD {
            return Err(AppError::smtp("535 5.7.8 authentication failed"));
        }

        self.mailboxes
            .lock()
            .unwrap()
            .entry(message.to.clone())
            .or_default()
            .push(Stored {
                from: message.from.clone(),
                subject: message.subject(),
                visible_at: Instant::now() + self.delivery_delay,
            });
        Ok(())
    }

    async fn try_delete_matching(
        &self,
        owner: &ProbeEndpoint,
        expected_from: &str,
        correlation_id: &str,
    ) -> Result<bool> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();

        let mut mailboxes = self.mailboxes.lock().unwrap();
        let Some(inbox) = mailboxes.get_mut(&owner.address) else {
            return Ok(false);
        };

        let position = inbox.iter().position(|stored| {
            stored.visible_at <= now
                && stored.from == expected_from
                && subject_matches(&stored.subject, correlation_id)
        });

        Ok(match position {
            Some(index) => {
                inbox.remove(index);
                true
            }
            None => false,
        })
    }
}

/// Transport whose submissions panic
#[derive(Default)]
pub struct ExplodingMail {
    pub submits: AtomicUsize,
}

#[async_trait]
impl MailTransport for ExplodingMail {
    async fn submit(&self, _sender: &ProbeEndpoint, _message: &TestMessage) -> Result<()> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        panic!("submission blew up");
    }

    async fn try_delete_matching(&self, _owner: &ProbeEndpoint, _from: &str, _id: &str) -> Result<bool> {
        Ok(false)
    }
}
