//! Mail transport abstraction and probe message model
//!
//! A probe message is submitted over SMTP by one side and looked up over
//! IMAP in the mailbox of the other side. Every lookup opens its own
//! session, so `try_delete_matching` is a single attempt and the retry
//! policy lives in [`search_and_delete`].

pub mod mailbox;
pub mod report;
pub mod smtp;

use crate::{
    defaults::{POLL_BACKOFF, SUBJECT_PREFIX},
    error::{AppError, Result},
    models::ProbeEndpoint,
    types::PollOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use tokio::time::Instant;

pub use report::ReportFetcher;

/// Length of the correlation identifier carried in probe subjects
pub const CORRELATION_ID_LEN: usize = 8;

/// Generate a short random correlation identifier
pub fn new_correlation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(CORRELATION_ID_LEN);
    id
}

/// Subject line of a probe message
pub fn probe_subject(correlation_id: &str) -> String {
    format!("{} - {}", SUBJECT_PREFIX, correlation_id)
}

/// Whether a decoded subject carries `correlation_id` as a whole token.
///
/// `abc1` does not match a subject carrying `abc123`.
pub fn subject_matches(subject: &str, correlation_id: &str) -> bool {
    if correlation_id.is_empty() {
        return false;
    }

    subject
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == correlation_id)
}

/// One in-flight deliverability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMessage {
    pub correlation_id: String,
    pub from: String,
    pub to: String,
    pub created_at: DateTime<Utc>,
}

impl TestMessage {
    pub fn new<S: Into<String>>(correlation_id: S, from: &str, to: &str) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            from: from.to_string(),
            to: to.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> String {
        probe_subject(&self.correlation_id)
    }

    /// Plain text body with the identifier and an ISO-8601 creation time
    pub fn body(&self) -> String {
        format!(
            "This is an automated test email from the mail health exporter service.\n\
             \n\
             Test ID: {}\n\
             Timestamp: {}\n\
             \n\
             This email should be automatically processed and deleted.\n",
            self.correlation_id,
            self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// Mail operations the probes depend on
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit `message` through the submission server of `sender`.
    /// One attempt, no retry.
    async fn submit(&self, sender: &ProbeEndpoint, message: &TestMessage) -> Result<()>;

    /// Open the INBOX of `owner` once, look for a probe from `expected_from`
    /// carrying `correlation_id` and delete the first confirmed match.
    /// Returns whether a message was deleted.
    async fn try_delete_matching(
        &self,
        owner: &ProbeEndpoint,
        expected_from: &str,
        correlation_id: &str,
    ) -> Result<bool>;
}

/// Bounds of a mailbox poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// No new attempt starts once this much time has passed
    pub deadline: Duration,
    /// Pause between attempts
    pub backoff: Duration,
}

impl PollPolicy {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            backoff: POLL_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Poll the mailbox of `owner` until the probe arrives or the deadline passes.
///
/// Connection and protocol errors count as "not yet" and are retried after
/// the backoff. The last pause is cut short at the deadline, so `NotFound`
/// arrives no earlier than the deadline and no later than the deadline plus
/// the duration of the final attempt.
pub async fn search_and_delete<T>(
    transport: &T,
    owner: &ProbeEndpoint,
    expected_from: &str,
    correlation_id: &str,
    policy: PollPolicy,
) -> PollOutcome
where
    T: MailTransport + ?Sized,
{
    let started = Instant::now();
    let mut attempt = 0u32;

    while started.elapsed() < policy.deadline {
        attempt += 1;
        match transport.try_delete_matching(owner, expected_from, correlation_id).await {
            Ok(true) => {
                tracing::debug!(
                    mailbox = %owner.address,
                    correlation_id,
                    attempt,
                    "Probe message found and deleted"
                );
                return PollOutcome::Found;
            }
            Ok(false) => {
                tracing::debug!(mailbox = %owner.address, correlation_id, attempt, "Probe message not there yet");
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    mailbox = %owner.address,
                    correlation_id,
                    attempt,
                    category = e.category(),
                    "Error checking for test email: {}",
                    e
                );
            }
            Err(e) => {
                tracing::error!(
                    mailbox = %owner.address,
                    correlation_id,
                    attempt,
                    category = e.category(),
                    "Error checking for test email: {}",
                    e
                );
            }
        }

        let remaining = policy.deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        tokio::time::sleep(policy.backoff.min(remaining)).await;
    }

    tracing::debug!(mailbox = %owner.address, correlation_id, attempts = attempt, "Gave up polling");
    PollOutcome::NotFound
}

/// Production transport: lettre for submission, a blocking IMAP session
/// on the blocking pool for mailbox access
#[derive(Debug, Clone)]
pub struct NetworkMailTransport {
    io_timeout: Duration,
}

impl NetworkMailTransport {
    /// `io_timeout` bounds each individual network operation
    pub fn new(io_timeout: Duration) -> Self {
        Self { io_timeout }
    }
}

#[async_trait]
impl MailTransport for NetworkMailTransport {
    async fn submit(&self, sender: &ProbeEndpoint, message: &TestMessage) -> Result<()> {
        smtp::send_message(sender, message, self.io_timeout).await
    }

    async fn try_delete_matching(
        &self,
        owner: &ProbeEndpoint,
        expected_from: &str,
        correlation_id: &str,
    ) -> Result<bool> {
        let owner = owner.clone();
        let expected_from = expected_from.to_string();
        let correlation_id = correlation_id.to_string();
        let io_timeout = self.io_timeout;

        tokio::task::spawn_blocking(move || {
            mailbox::delete_matching(&owner, &expected_from, &correlation_id, io_timeout)
        })
        .await
        .map_err(|e| AppError::imap(format!("Mailbox task failed: {}", e)))?
    }
}
