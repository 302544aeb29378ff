//! Bidirectional deliverability check

use crate::{
    client::{new_correlation_id, search_and_delete, MailTransport, PollPolicy, TestMessage},
    models::{Config, ProbeEndpoint},
    store::{epoch_seconds, MetricsStore},
    types::{Direction, Side},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one direction of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionReport {
    pub direction: Direction,
    pub sent: bool,
    pub received: bool,
}

/// Outcome of one full cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub correlation_id: String,
    pub directions: Vec<DirectionReport>,
    pub duration: Duration,
}

impl CycleReport {
    /// Every send and every receive succeeded
    pub fn is_healthy(&self) -> bool {
        self.directions.iter().all(|d| d.sent && d.received)
    }

    pub fn direction(&self, direction: Direction) -> Option<&DirectionReport> {
        self.directions.iter().find(|d| d.direction == direction)
    }
}

/// Sends a probe internal -> external and back, waiting for each to arrive
pub struct RoundTripProbe {
    transport: Arc<dyn MailTransport>,
    store: Arc<MetricsStore>,
    internal: ProbeEndpoint,
    external: ProbeEndpoint,
    poll: PollPolicy,
}

impl RoundTripProbe {
    pub fn new(config: &Config, transport: Arc<dyn MailTransport>, store: Arc<MetricsStore>) -> Self {
        Self {
            transport,
            store,
            internal: config.internal.clone(),
            external: config.external.clone(),
            poll: PollPolicy::new(config.timeout()),
        }
    }

    /// Override the poll deadline and backoff
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    fn endpoint(&self, side: Side) -> &ProbeEndpoint {
        match side {
            Side::Internal => &self.internal,
            Side::External => &self.external,
        }
    }

    /// Run a full cycle under a fresh correlation identifier
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_with_id(new_correlation_id()).await
    }

    /// Run a full cycle under `correlation_id`. Never fails: every step
    /// runs and records its own outcome.
    pub async fn run_cycle_with_id(&self, correlation_id: String) -> CycleReport {
        let started = Instant::now();
        let mut directions = Vec::with_capacity(Direction::ALL.len());

        for direction in Direction::ALL {
            tracing::info!("Starting mail test ({}) with ID: {}", direction, correlation_id);
            directions.push(self.run_direction(direction, &correlation_id).await);
        }

        let duration = started.elapsed();
        self.store.record_roundtrip(duration, epoch_seconds());
        tracing::info!("Mail test completed in {:.2} seconds", duration.as_secs_f64());

        CycleReport {
            correlation_id,
            directions,
            duration,
        }
    }

    async fn run_direction(&self, direction: Direction, correlation_id: &str) -> DirectionReport {
        let sender = self.endpoint(direction.sender());
        let recipient = self.endpoint(direction.recipient());
        let message = TestMessage::new(correlation_id, &sender.address, &recipient.address);

        let sent = match self.transport.submit(sender, &message).await {
            Ok(()) => {
                tracing::info!("Successfully sent test email with ID: {}", correlation_id);
                true
            }
            Err(e) => {
                tracing::error!(%direction, category = e.category(), "Failed to send test email: {}", e);
                false
            }
        };
        self.store.record_send(direction, sent);

        // A failed send still polls, so a failing submission path also shows
        // up as a receive failure
        let outcome = search_and_delete(
            self.transport.as_ref(),
            recipient,
            &sender.address,
            correlation_id,
            self.poll,
        )
        .await;

        let received = outcome.is_found();
        if received {
            tracing::info!("Successfully received and deleted test email: {}", correlation_id);
        } else {
            tracing::error!(
                "Test email not found within {} seconds: {}",
                self.poll.deadline.as_secs(),
                correlation_id
            );
        }
        self.store.record_receive(direction, received);

        DirectionReport {
            direction,
            sent,
            received,
        }
    }
}
