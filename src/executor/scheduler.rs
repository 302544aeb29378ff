//! Repeating check loop with spam score rate limiting and failure recovery

use crate::{
    defaults::{RECOVERY_DELAY, SPAM_SCORE_INTERVAL},
    executor::{roundtrip::CycleReport, RoundTripProbe, SpamScoreProbe},
    types::Signal,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Allows an action at most once per interval. The first call always passes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Claim the slot at `now` if the interval has elapsed since the last claim
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn last(&self) -> Option<Instant> {
        self.last
    }
}

/// What one tick did
#[derive(Debug, Clone)]
pub struct TickReport {
    pub cycle: CycleReport,
    /// Score recorded in this tick, `None` when the check was rate limited
    pub spam_score: Option<u8>,
}

/// Drives the probes: one round trip per tick, a spam check when due
pub struct Scheduler {
    roundtrip: RoundTripProbe,
    spam_score: SpamScoreProbe,
    spam_limiter: RateLimiter,
    check_interval: Duration,
    recovery_delay: Duration,
}

impl Scheduler {
    pub fn new(roundtrip: RoundTripProbe, spam_score: SpamScoreProbe, check_interval: Duration) -> Self {
        Self {
            roundtrip,
            spam_score,
            spam_limiter: RateLimiter::new(SPAM_SCORE_INTERVAL),
            check_interval,
            recovery_delay: RECOVERY_DELAY,
        }
    }

    pub fn with_recovery_delay(mut self, delay: Duration) -> Self {
        self.recovery_delay = delay;
        self
    }

    /// Run one round trip, then the spam check if it is due
    pub async fn tick(&mut self) -> TickReport {
        let cycle = self.roundtrip.run_cycle().await;
        let spam_score = self.spam_check_at(Instant::now()).await;
        TickReport { cycle, spam_score }
    }

    /// Run the spam check if six hours passed since the last one at `now`
    pub async fn spam_check_at(&mut self, now: Instant) -> Option<u8> {
        if self.spam_limiter.try_acquire(now) {
            Some(self.spam_score.run().await)
        } else {
            tracing::info!("Spam score test doesn't need to run yet.");
            None
        }
    }

    /// Tick until a shutdown signal arrives. A panicking tick is logged and
    /// followed by the recovery delay instead of the check interval.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<Signal>) {
        tracing::info!("Mail Health Exporter service starting...");

        loop {
            let delay = match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(report) => {
                    tracing::debug!(
                        healthy = report.cycle.is_healthy(),
                        spam_checked = report.spam_score.is_some(),
                        "Check finished"
                    );
                    tracing::info!("Waiting {} seconds until next check...", self.check_interval.as_secs());
                    self.check_interval
                }
                Err(panic) => {
                    tracing::error!("Unexpected error in main loop: {}", panic_message(panic.as_ref()));
                    self.recovery_delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Scheduler received shutdown signal");
                    break;
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
